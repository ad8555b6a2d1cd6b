use std::path::Path;

use barter_core::{BarterError, ChainId, Item, ItemId, ItemStatus, Timestamp, UserId};
use barter_discovery::RejectionLookup;
use barter_ports::ItemLocker;

use crate::model::{ChainParticipant, ChainProposal, EscrowHold, RejectedChainRecord, ShipmentTrackingRow};

fn storage_err(e: sled::Error) -> BarterError {
    BarterError::Storage(e.to_string())
}

fn ser<T: serde::Serialize>(v: &T) -> Result<Vec<u8>, BarterError> {
    bincode::serialize(v).map_err(|e| BarterError::Serialization(e.to_string()))
}

fn de<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T, BarterError> {
    bincode::deserialize(bytes).map_err(|e| BarterError::Serialization(e.to_string()))
}

fn participant_key(chain_id: ChainId, position: u32) -> [u8; 12] {
    let mut key = [0u8; 12];
    key[0..8].copy_from_slice(&chain_id.0.to_be_bytes());
    key[8..12].copy_from_slice(&position.to_be_bytes());
    key
}

fn hold_key(chain_id: ChainId, hold_id: u64) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[0..8].copy_from_slice(&chain_id.0.to_be_bytes());
    key[8..16].copy_from_slice(&hold_id.to_be_bytes());
    key
}

fn tracking_key(chain_id: ChainId, user_id: UserId) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[0..8].copy_from_slice(&chain_id.0.to_be_bytes());
    key[8..16].copy_from_slice(&user_id.0.to_be_bytes());
    key
}

/// Persistent store backed by sled, one named tree per `spec.md` §6
/// table. Named trees:
///
///   chain_proposals   — ChainId be bytes               → bincode(ChainProposal)
///   chain_participants— ChainId be bytes ++ position    → bincode(ChainParticipant)
///   rejected_chains   — cycle_hash utf8 bytes           → bincode(RejectedChainRecord)
///   escrow_holds      — ChainId be bytes ++ hold id     → bincode(EscrowHold)
///   shipment_tracking — ChainId be bytes ++ UserId      → bincode(ShipmentTrackingRow)
///   items             — ItemId be bytes                 → bincode(Item)
///   meta              — utf8 key bytes                  → raw bytes
///
/// `items` is not one of the engine's own tables per `spec.md` §3 (items
/// are "owned by the external inventory subsystem") — it exists here only
/// so the standalone binary and tests have somewhere to perform the
/// item-lock CAS; a real deployment would point `ItemLocker` at the
/// inventory service instead.
pub struct BarterDb {
    _db: sled::Db,
    chain_proposals: sled::Tree,
    chain_participants: sled::Tree,
    rejected_chains: sled::Tree,
    escrow_holds: sled::Tree,
    shipment_tracking: sled::Tree,
    items: sled::Tree,
    proposal_fingerprints: sled::Tree,
    meta: sled::Tree,
}

impl BarterDb {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, BarterError> {
        let db = sled::open(path).map_err(storage_err)?;
        let chain_proposals = db.open_tree("chain_proposals").map_err(storage_err)?;
        let chain_participants = db.open_tree("chain_participants").map_err(storage_err)?;
        let rejected_chains = db.open_tree("rejected_chains").map_err(storage_err)?;
        let escrow_holds = db.open_tree("escrow_holds").map_err(storage_err)?;
        let shipment_tracking = db.open_tree("shipment_tracking").map_err(storage_err)?;
        let items = db.open_tree("items").map_err(storage_err)?;
        let proposal_fingerprints = db.open_tree("proposal_fingerprints").map_err(storage_err)?;
        let meta = db.open_tree("meta").map_err(storage_err)?;
        Ok(Self {
            _db: db,
            chain_proposals,
            chain_participants,
            rejected_chains,
            escrow_holds,
            shipment_tracking,
            items,
            proposal_fingerprints,
            meta,
        })
    }

    pub fn flush(&self) -> Result<(), BarterError> {
        self._db.flush().map_err(storage_err)?;
        Ok(())
    }

    // ── Id allocation ────────────────────────────────────────────────────

    fn next_counter(&self, key: &str) -> Result<u64, BarterError> {
        let current = self
            .meta
            .get(key.as_bytes())
            .map_err(storage_err)?
            .map(|b| {
                let mut arr = [0u8; 8];
                arr.copy_from_slice(&b[..8]);
                u64::from_be_bytes(arr)
            })
            .unwrap_or(1);
        self.meta
            .insert(key.as_bytes(), &(current + 1).to_be_bytes())
            .map_err(storage_err)?;
        Ok(current)
    }

    pub fn next_chain_id(&self) -> Result<ChainId, BarterError> {
        self.next_counter("next_chain_id").map(ChainId)
    }

    pub fn next_hold_id(&self) -> Result<u64, BarterError> {
        self.next_counter("next_hold_id")
    }

    // ── Chain proposals ──────────────────────────────────────────────────

    pub fn get_proposal(&self, id: ChainId) -> Result<Option<ChainProposal>, BarterError> {
        match self.chain_proposals.get(id.0.to_be_bytes()).map_err(storage_err)? {
            Some(bytes) => Ok(Some(de(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn put_proposal(&self, proposal: &ChainProposal) -> Result<(), BarterError> {
        let bytes = ser(proposal)?;
        self.chain_proposals
            .insert(proposal.id.0.to_be_bytes(), bytes)
            .map_err(storage_err)?;
        Ok(())
    }

    pub fn iter_all_proposals(&self) -> Result<Vec<ChainProposal>, BarterError> {
        let mut out = Vec::new();
        for item in self.chain_proposals.iter() {
            let (_, bytes) = item.map_err(storage_err)?;
            out.push(de(&bytes)?);
        }
        Ok(out)
    }

    // ── Chain participants ───────────────────────────────────────────────

    pub fn put_participant(&self, p: &ChainParticipant) -> Result<(), BarterError> {
        let key = participant_key(p.chain_id, p.position);
        let bytes = ser(p)?;
        self.chain_participants.insert(key, bytes).map_err(storage_err)?;
        Ok(())
    }

    /// Participants for one chain, in insertion (`position`) order — the
    /// key prefix guarantees this without a secondary index.
    pub fn get_participants(&self, chain_id: ChainId) -> Result<Vec<ChainParticipant>, BarterError> {
        let prefix = chain_id.0.to_be_bytes();
        let mut out = Vec::new();
        for item in self.chain_participants.scan_prefix(prefix) {
            let (_, bytes) = item.map_err(storage_err)?;
            out.push(de(&bytes)?);
        }
        Ok(out)
    }

    /// Chain ids in which `user_id` participates. No secondary index
    /// exists for this (mirrors the teacher's `iter_timelocks_for_*`
    /// pattern of an in-memory scan-and-filter over the whole tree); fine
    /// at the scale this engine targets.
    pub fn list_chain_ids_for_user(&self, user_id: UserId) -> Result<Vec<ChainId>, BarterError> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for item in self.chain_participants.iter() {
            let (_, bytes) = item.map_err(storage_err)?;
            let p: ChainParticipant = de(&bytes)?;
            if p.user_id == user_id && seen.insert(p.chain_id) {
                out.push(p.chain_id);
            }
        }
        Ok(out)
    }

    // ── Rejected-cycle records ───────────────────────────────────────────

    pub fn get_rejection(&self, fingerprint: &str) -> Result<Option<RejectedChainRecord>, BarterError> {
        match self.rejected_chains.get(fingerprint.as_bytes()).map_err(storage_err)? {
            Some(bytes) => Ok(Some(de(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn put_rejection(&self, record: &RejectedChainRecord) -> Result<(), BarterError> {
        let bytes = ser(record)?;
        self.rejected_chains
            .insert(record.cycle_hash.as_bytes(), bytes)
            .map_err(storage_err)?;
        Ok(())
    }

    // ── Proposal fingerprint index (idempotent re-proposal guard) ───────

    /// `fingerprint` is the C4 cycle-hash of a proposal's participant set,
    /// recorded at creation time so a later discovery pass for the exact
    /// same cycle can find the still-open proposal instead of creating a
    /// duplicate (§2 supplement).
    pub fn put_fingerprint_index(&self, fingerprint: &str, chain_id: ChainId) -> Result<(), BarterError> {
        self.proposal_fingerprints
            .insert(fingerprint.as_bytes(), &chain_id.0.to_be_bytes())
            .map_err(storage_err)?;
        Ok(())
    }

    pub fn get_chain_id_by_fingerprint(&self, fingerprint: &str) -> Result<Option<ChainId>, BarterError> {
        match self.proposal_fingerprints.get(fingerprint.as_bytes()).map_err(storage_err)? {
            Some(bytes) => {
                let mut arr = [0u8; 8];
                arr.copy_from_slice(&bytes);
                Ok(Some(ChainId(u64::from_be_bytes(arr))))
            }
            None => Ok(None),
        }
    }

    // ── Escrow holds ─────────────────────────────────────────────────────

    pub fn put_hold(&self, hold: &EscrowHold) -> Result<(), BarterError> {
        let key = hold_key(hold.chain_id, hold.id);
        let bytes = ser(hold)?;
        self.escrow_holds.insert(key, bytes).map_err(storage_err)?;
        Ok(())
    }

    pub fn list_holds_for_chain(&self, chain_id: ChainId) -> Result<Vec<EscrowHold>, BarterError> {
        let prefix = chain_id.0.to_be_bytes();
        let mut out = Vec::new();
        for item in self.escrow_holds.scan_prefix(prefix) {
            let (_, bytes) = item.map_err(storage_err)?;
            out.push(de(&bytes)?);
        }
        Ok(out)
    }

    // ── Shipment tracking ────────────────────────────────────────────────

    pub fn put_tracking(&self, row: &ShipmentTrackingRow) -> Result<(), BarterError> {
        let key = tracking_key(row.chain_id, row.user_id);
        let bytes = ser(row)?;
        self.shipment_tracking.insert(key, bytes).map_err(storage_err)?;
        Ok(())
    }

    pub fn get_tracking(&self, chain_id: ChainId, user_id: UserId) -> Result<Option<ShipmentTrackingRow>, BarterError> {
        let key = tracking_key(chain_id, user_id);
        match self.shipment_tracking.get(key).map_err(storage_err)? {
            Some(bytes) => Ok(Some(de(&bytes)?)),
            None => Ok(None),
        }
    }

    // ── Items (local inventory mirror, see struct doc) ──────────────────

    pub fn put_item(&self, item: &Item) -> Result<(), BarterError> {
        let bytes = ser(item)?;
        self.items.insert(item.id.0.to_be_bytes(), bytes).map_err(storage_err)?;
        Ok(())
    }

    pub fn get_item(&self, item_id: ItemId) -> Result<Option<Item>, BarterError> {
        match self.items.get(item_id.0.to_be_bytes()).map_err(storage_err)? {
            Some(bytes) => Ok(Some(de(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn iter_all_items(&self) -> Result<Vec<Item>, BarterError> {
        let mut out = Vec::new();
        for item in self.items.iter() {
            let (_, bytes) = item.map_err(storage_err)?;
            out.push(de(&bytes)?);
        }
        Ok(out)
    }
}

impl RejectionLookup for BarterDb {
    fn is_rejected(&self, fingerprint: &str, now: Timestamp) -> bool {
        match self.get_rejection(fingerprint) {
            Ok(Some(record)) => record.expires_at > now,
            _ => false,
        }
    }
}

impl ItemLocker for BarterDb {
    fn try_lock(&self, item_id: ItemId) -> Result<bool, BarterError> {
        let key = item_id.0.to_be_bytes();
        let current = self
            .items
            .get(key)
            .map_err(storage_err)?
            .ok_or_else(|| BarterError::ItemNotFound(item_id.to_string()))?;
        let mut item: Item = de(&current)?;
        if item.status != ItemStatus::Active {
            return Ok(false);
        }
        item.status = ItemStatus::Locked;
        let new_bytes = ser(&item)?;
        match self.items.compare_and_swap(key, Some(current.as_ref()), Some(new_bytes)) {
            Ok(Ok(())) => Ok(true),
            Ok(Err(_)) => Ok(false),
            Err(e) => Err(storage_err(e)),
        }
    }

    fn unlock(&self, item_id: ItemId) -> Result<(), BarterError> {
        let key = item_id.0.to_be_bytes();
        let current = self
            .items
            .get(key)
            .map_err(storage_err)?
            .ok_or_else(|| BarterError::ItemNotFound(item_id.to_string()))?;
        let mut item: Item = de(&current)?;
        item.status = ItemStatus::Active;
        let bytes = ser(&item)?;
        self.items.insert(key, bytes).map_err(storage_err)?;
        Ok(())
    }

    fn transfer(&self, item_id: ItemId, new_owner: UserId) -> Result<(), BarterError> {
        let key = item_id.0.to_be_bytes();
        let current = self
            .items
            .get(key)
            .map_err(storage_err)?
            .ok_or_else(|| BarterError::ItemNotFound(item_id.to_string()))?;
        let mut item: Item = de(&current)?;
        item.owner = new_owner;
        item.status = ItemStatus::Active;
        let bytes = ser(&item)?;
        self.items.insert(key, bytes).map_err(storage_err)?;
        Ok(())
    }
}
