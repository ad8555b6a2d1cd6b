use barter_core::{ItemId, UserId};

/// One `(userId, givesItemId)` pair contributing to a cycle's fingerprint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CycleMember {
    pub user: UserId,
    pub gives_item: ItemId,
}

/// Order-independent fingerprint for a chain cycle, per `spec.md` §4.4.
///
/// ```text
/// participant_data = sort_ascending({ f"{userId}:{givesItemId}" for each participant }).join("|")
/// hash = signed 32-bit rolling hash: h ← 0; for each codepoint c: h ← ((h << 5) − h + c) as i32
/// fingerprint = "cycle_" + hex(|hash|)
/// ```
///
/// The algorithm is prescribed exactly because the discovery filter and the
/// coordinator's rejection writer must agree bit-for-bit; do not "improve"
/// it without updating both call sites.
pub fn cycle_fingerprint(members: &[CycleMember]) -> String {
    let mut parts: Vec<String> = members
        .iter()
        .map(|m| format!("{}:{}", m.user.0, m.gives_item.0))
        .collect();
    parts.sort();
    let participant_data = parts.join("|");

    let mut h: i32 = 0;
    for c in participant_data.chars() {
        h = h.wrapping_shl(5).wrapping_sub(h).wrapping_add(c as i32);
    }

    format!("cycle_{:x}", h.unsigned_abs())
}
