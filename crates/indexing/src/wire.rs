//! Flat JSON encoding of [`IndexingCommand`] for cross-thread and
//! cross-process transport.

use crate::command::{CommandType, IndexingCommand};
use crate::document::DocumentRef;
use crate::{IndexingError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WireCommand {
    pub id: String,
    #[serde(rename = "type")]
    pub command_type: CommandType,
    pub doc_id: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub repo: Option<String>,
    #[serde(default)]
    pub recurse: bool,
    #[serde(default)]
    pub sync: bool,
}

impl From<&IndexingCommand> for WireCommand {
    fn from(cmd: &IndexingCommand) -> Self {
        Self {
            id: cmd.id().to_string(),
            command_type: cmd.command_type(),
            doc_id: cmd.doc_id().to_string(),
            path: cmd.path().map(str::to_string),
            repo: Some(cmd.repository_name().to_string()),
            recurse: cmd.is_recurse(),
            sync: cmd.is_sync(),
        }
    }
}

impl TryFrom<WireCommand> for IndexingCommand {
    type Error = IndexingError;

    fn try_from(wire: WireCommand) -> Result<Self> {
        if wire.id.is_empty() {
            return Err(IndexingError::Wire("empty command id".to_string()));
        }
        if wire.doc_id.is_empty() {
            return Err(IndexingError::Wire("empty docId".to_string()));
        }
        let target = DocumentRef {
            repository: wire.repo.unwrap_or_default(),
            id: wire.doc_id,
            path: wire.path,
            folder: false,
            schemas: Vec::new(),
        };
        Ok(IndexingCommand::from_parts(
            wire.id,
            wire.command_type,
            wire.sync,
            wire.recurse,
            target,
        ))
    }
}

impl IndexingCommand {
    pub fn to_wire_value(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(WireCommand::from(self))?)
    }

    pub fn to_wire(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&WireCommand::from(self))?)
    }

    /// Decode a command. The target comes back without folder flag or
    /// schemas; `refresh` restores them from a session.
    pub fn from_wire(bytes: &[u8]) -> Result<Self> {
        let wire: WireCommand =
            serde_json::from_slice(bytes).map_err(|e| IndexingError::Wire(e.to_string()))?;
        Self::try_from(wire)
    }

    pub fn from_wire_value(value: serde_json::Value) -> Result<Self> {
        let wire: WireCommand =
            serde_json::from_value(value).map_err(|e| IndexingError::Wire(e.to_string()))?;
        Self::try_from(wire)
    }
}

/// JSON schema of the wire payload.
pub fn wire_schema() -> Result<serde_json::Value> {
    Ok(serde_json::to_value(schemars::schema_for!(WireCommand))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample(ty: CommandType, sync: bool, recurse: bool) -> IndexingCommand {
        let doc = DocumentRef::new("default", "doc-1").with_path("/ws/folder");
        IndexingCommand::new(&doc, ty, sync, recurse).expect("cmd")
    }

    #[test]
    fn round_trip_preserves_every_wire_field() {
        for (ty, sync, recurse) in [
            (CommandType::Index, true, false),
            (CommandType::UpdateSecurity, false, true),
            (CommandType::Delete, true, true),
        ] {
            let cmd = sample(ty, sync, recurse);
            let back = IndexingCommand::from_wire(&cmd.to_wire().expect("encode")).expect("decode");
            assert_eq!(WireCommand::from(&back), WireCommand::from(&cmd));
        }
    }

    #[test]
    fn encodes_flat_camel_case_object() {
        let cmd = sample(CommandType::UpdateSecurity, false, true);
        let value = cmd.to_wire_value().expect("encode");
        assert_eq!(
            value,
            json!({
                "id": cmd.id(),
                "type": "UPDATE_SECURITY",
                "docId": "doc-1",
                "path": "/ws/folder",
                "repo": "default",
                "recurse": true,
                "sync": false,
            })
        );
    }

    #[test]
    fn ignores_unknown_fields_and_defaults_flags() {
        let cmd = IndexingCommand::from_wire_value(json!({
            "id": "c1",
            "type": "DELETE",
            "docId": "doc-9",
            "extra": [1, 2, 3],
        }))
        .expect("decode");
        assert_eq!(cmd.id(), "c1");
        assert_eq!(cmd.doc_id(), "doc-9");
        assert_eq!(cmd.path(), None);
        assert_eq!(cmd.repository_name(), "");
        assert!(!cmd.is_sync() && !cmd.is_recurse());
    }

    #[test]
    fn missing_mandatory_fields_fail() {
        let no_doc = IndexingCommand::from_wire_value(json!({ "id": "c1", "type": "INDEX" }));
        let err = no_doc.expect_err("docId missing");
        assert!(matches!(err, IndexingError::Wire(ref msg) if msg.contains("docId")));

        let no_id = IndexingCommand::from_wire_value(json!({ "type": "INDEX", "docId": "d" }));
        assert!(matches!(no_id, Err(IndexingError::Wire(_))));

        let empty =
            IndexingCommand::from_wire_value(json!({ "id": "c", "type": "INDEX", "docId": "" }));
        assert!(matches!(empty, Err(IndexingError::Wire(_))));
    }

    #[test]
    fn malformed_payloads_fail() {
        assert!(IndexingCommand::from_wire(b"{not json").is_err());
        assert!(IndexingCommand::from_wire(b"[]").is_err());
        let bad_type = IndexingCommand::from_wire_value(json!({
            "id": "c", "type": "REINDEX", "docId": "d"
        }));
        assert!(matches!(bad_type, Err(IndexingError::Wire(_))));
    }

    #[test]
    fn decoding_keeps_merged_flags() {
        let doc = DocumentRef::new("default", "d");
        let mut cmd = IndexingCommand::new(&doc, CommandType::Update, false, true).expect("cmd");
        let sync = IndexingCommand::new(&doc, CommandType::Update, true, false).expect("sync");
        cmd.update(&sync);

        let back = IndexingCommand::from_wire(&cmd.to_wire().expect("encode")).expect("decode");
        assert!(back.is_sync() && back.is_recurse());
    }

    #[test]
    fn schema_lists_wire_fields() {
        let schema = wire_schema().expect("schema");
        let props = schema["properties"].as_object().expect("properties");
        for field in ["id", "type", "docId", "path", "repo", "recurse", "sync"] {
            assert!(props.contains_key(field), "missing {field}");
        }
    }
}
