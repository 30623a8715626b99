//! Off-chain draft proposals.
//!
//! Drafts are stored as one bare JSON array. Reads are public; every write
//! carries a personal signature of [`DRAFT_SIGN_MSG`] whose signer must be on
//! the allow-list. Unlike the snapshot caches, draft storage fails closed: a
//! store error is reported, never treated as an empty list.

use alloy_primitives::{Bytes, Signature};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

use inverse_store::{keys, KvStore};
use inverse_types::{Address, Clock, Timestamp};

use crate::{DraftError, ProposalFunction};

/// Message draft editors sign to prove their address.
pub const DRAFT_SIGN_MSG: &str =
    "Inverse Finance draft proposals\n\nSign this message to create, update or delete draft proposals.";

const MAX_TITLE_CHARS: usize = 200;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub public_draft_id: u64,
    pub title: String,
    pub description: String,
    pub functions: Vec<ProposalFunction>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub created_by: Address,
    pub updated_by: Address,
}

/// A proposal action as submitted; validated before it is stored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftFunctionInput {
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub signature: String,
    #[serde(default)]
    pub call_data: String,
}

impl DraftFunctionInput {
    /// The typed action, or `None` if any field is malformed.
    pub fn validate(&self) -> Option<ProposalFunction> {
        let target = Address::from_str(self.target.trim()).ok()?;
        let signature = self.signature.trim();
        if !is_function_signature(signature) {
            return None;
        }
        let call_data = self.call_data.trim();
        if !call_data.starts_with("0x") {
            return None;
        }
        let call_data = Bytes::from_str(call_data).ok()?;
        Some(ProposalFunction {
            target,
            signature: signature.to_string(),
            call_data,
        })
    }
}

/// `name(type,...)` with an identifier name and no nested parentheses.
fn is_function_signature(s: &str) -> bool {
    let Some((name, rest)) = s.split_once('(') else {
        return false;
    };
    let Some(args) = rest.strip_suffix(')') else {
        return false;
    };
    let mut name_chars = name.chars();
    let valid_name = name_chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name_chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    let valid_args = args
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, ',' | '[' | ']' | '_'));
    valid_name && valid_args
}

/// Body of a create or update request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftInput {
    #[serde(default)]
    pub sig: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub functions: Vec<DraftFunctionInput>,
}

struct ValidDraft {
    title: String,
    description: String,
    functions: Vec<ProposalFunction>,
}

impl DraftInput {
    /// Drop malformed actions, then check the remaining form.
    fn validate(&self) -> Result<ValidDraft, DraftError> {
        let functions: Vec<_> = self
            .functions
            .iter()
            .filter_map(DraftFunctionInput::validate)
            .collect();
        let title = self.title.trim();
        let description = self.description.trim();
        if title.is_empty() {
            return Err(DraftError::Invalid("title is required"));
        }
        if title.chars().count() > MAX_TITLE_CHARS {
            return Err(DraftError::Invalid("title is too long"));
        }
        if description.is_empty() {
            return Err(DraftError::Invalid("description is required"));
        }
        if functions.is_empty() {
            return Err(DraftError::Invalid("at least one valid action is required"));
        }
        Ok(ValidDraft {
            title: title.to_string(),
            description: description.to_string(),
            functions,
        })
    }
}

/// Addresses allowed to write drafts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AllowList(HashSet<Address>);

impl AllowList {
    pub fn new(addresses: impl IntoIterator<Item = Address>) -> Self {
        Self(addresses.into_iter().collect())
    }

    /// Parse a comma separated list. Whitespace and case are ignored;
    /// entries that are not addresses are skipped.
    pub fn parse(list: &str) -> Self {
        let compact: String = list.chars().filter(|c| !c.is_whitespace()).collect();
        let addresses = compact
            .split(',')
            .filter(|entry| !entry.is_empty())
            .filter_map(|entry| match Address::from_str(entry) {
                Ok(address) => Some(address),
                Err(e) => {
                    warn!(entry, error = %e, "ignoring malformed allow-list entry");
                    None
                }
            });
        Self::new(addresses)
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.0.contains(address)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Recover the address that signed [`DRAFT_SIGN_MSG`].
pub fn recover_signer(sig: &str) -> Result<Address, DraftError> {
    let signature =
        Signature::from_str(sig.trim()).map_err(|e| DraftError::InvalidSignature(e.to_string()))?;
    signature
        .recover_address_from_msg(DRAFT_SIGN_MSG)
        .map_err(|e| DraftError::InvalidSignature(e.to_string()))
}

/// Draft CRUD over the bare `drafts` array.
///
/// Every write is read-modify-write of the whole array with no lock, so
/// concurrent creates can pick the same `publicDraftId` and the last write
/// wins, dropping the other draft. Ids are not unique under concurrency.
pub struct DraftService {
    store: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
    allow_list: AllowList,
}

impl DraftService {
    pub fn new(store: Arc<dyn KvStore>, clock: Arc<dyn Clock>, allow_list: AllowList) -> Self {
        Self {
            store,
            clock,
            allow_list,
        }
    }

    pub async fn list(&self) -> Result<Vec<Draft>, DraftError> {
        match self.store.get(keys::DRAFTS).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    pub async fn get(&self, id: u64) -> Result<Draft, DraftError> {
        self.list()
            .await?
            .into_iter()
            .find(|d| d.public_draft_id == id)
            .ok_or_else(|| DraftError::NotFound(id.to_string()))
    }

    pub async fn create(&self, input: &DraftInput) -> Result<Draft, DraftError> {
        let signer = self.authorize(&input.sig)?;
        let valid = input.validate()?;
        let mut drafts = self.list().await?;
        let id = drafts.iter().map(|d| d.public_draft_id).max().unwrap_or(0) + 1;
        let now = self.clock.now();
        let draft = Draft {
            public_draft_id: id,
            title: valid.title,
            description: valid.description,
            functions: valid.functions,
            created_at: now,
            updated_at: now,
            created_by: signer,
            updated_by: signer,
        };
        drafts.push(draft.clone());
        self.save(&drafts).await?;
        info!(id, signer = %signer, "draft created");
        Ok(draft)
    }

    pub async fn update(&self, id: u64, input: &DraftInput) -> Result<Draft, DraftError> {
        let signer = self.authorize(&input.sig)?;
        let mut drafts = self.list().await?;
        let index = drafts
            .iter()
            .position(|d| d.public_draft_id == id)
            .ok_or_else(|| DraftError::NotFound(id.to_string()))?;
        let valid = input.validate()?;

        let existing = &drafts[index];
        let draft = Draft {
            public_draft_id: id,
            title: valid.title,
            description: valid.description,
            functions: valid.functions,
            created_at: existing.created_at,
            updated_at: self.clock.now(),
            created_by: existing.created_by,
            updated_by: signer,
        };
        drafts[index] = draft.clone();
        self.save(&drafts).await?;
        info!(id, signer = %signer, "draft updated");
        Ok(draft)
    }

    pub async fn delete(&self, id: u64, sig: &str) -> Result<(), DraftError> {
        let signer = self.authorize(sig)?;
        let mut drafts = self.list().await?;
        let index = drafts
            .iter()
            .position(|d| d.public_draft_id == id)
            .ok_or_else(|| DraftError::NotFound(id.to_string()))?;
        drafts.remove(index);
        self.save(&drafts).await?;
        info!(id, signer = %signer, "draft removed");
        Ok(())
    }

    fn authorize(&self, sig: &str) -> Result<Address, DraftError> {
        let signer = recover_signer(sig).inspect_err(|e| {
            warn!(kind = e.kind(), error = %e, "draft write with unusable signature");
        })?;
        if !self.allow_list.contains(&signer) {
            warn!(kind = "draft_unauthorized", signer = %signer, "draft write rejected");
            return Err(DraftError::Unauthorized);
        }
        Ok(signer)
    }

    async fn save(&self, drafts: &[Draft]) -> Result<(), DraftError> {
        let encoded = serde_json::to_string(drafts)?;
        self.store.set(keys::DRAFTS, &encoded).await?;
        Ok(())
    }
}
