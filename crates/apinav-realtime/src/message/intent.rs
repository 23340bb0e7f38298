//! Conversion between wire intents and typed mutations.

use serde_json::{Map, Value, json};

use apinav_core::error::AppError;
use apinav_core::result::AppResult;
use apinav_core::types::id::{CollectionId, CorrelationId, FolderId, RequestId};
use apinav_entity::{FolderPath, RequestPatch};
use apinav_service::Mutation;

use super::types::MutateIntent;

/// Argument keys that address a node rather than describe request fields.
const CONTROL_KEYS: &[&str] = &["requestId", "folderId", "folderNames", "hidden", "newName"];

impl MutateIntent {
    /// Encode a typed mutation.
    pub fn from_mutation(correlation_id: Option<CorrelationId>, mutation: &Mutation) -> Self {
        let mut intent = Self {
            correlation_id,
            op: mutation.op_name().to_string(),
            collection_id: mutation.collection_id().cloned(),
            folder_path: None,
            args: Value::Object(Map::new()),
        };
        match mutation {
            Mutation::AddCollection { name } | Mutation::RenameCollection { name, .. } => {
                intent.args = json!({ "name": name });
            }
            Mutation::DeleteCollection { .. }
            | Mutation::DuplicateCollection { .. }
            | Mutation::ClearCollections => {}
            Mutation::AddFolder { path, name, .. } => {
                intent.folder_path = Some(path.clone());
                intent.args = json!({ "name": name });
            }
            Mutation::RenameFolder {
                folder_id,
                path,
                name,
                ..
            } => {
                intent.folder_path = path.clone();
                intent.args = json!({ "folderId": folder_id, "name": name });
            }
            Mutation::DeleteFolder {
                folder_id, path, ..
            }
            | Mutation::DuplicateFolder {
                folder_id, path, ..
            } => {
                intent.folder_path = path.clone();
                intent.args = json!({ "folderId": folder_id });
            }
            Mutation::AddRequest { path, draft, .. } => {
                intent.folder_path = Some(path.clone());
                intent.args = patch_args(draft);
            }
            Mutation::UpdateRequest {
                request_id,
                path,
                patch,
                ..
            } => {
                intent.folder_path = path.clone();
                let mut args = patch_args(patch);
                insert(&mut args, "requestId", json!(request_id));
                intent.args = args;
            }
            Mutation::RenameRequest {
                request_id,
                path,
                name,
                ..
            } => {
                intent.folder_path = path.clone();
                intent.args = json!({ "requestId": request_id, "name": name });
            }
            Mutation::DeleteRequest {
                request_id, path, ..
            }
            | Mutation::DuplicateRequest {
                request_id, path, ..
            } => {
                intent.folder_path = path.clone();
                intent.args = json!({ "requestId": request_id });
            }
            Mutation::SetRequestHidden {
                request_id,
                path,
                hidden,
                ..
            } => {
                intent.folder_path = path.clone();
                intent.args = json!({ "requestId": request_id, "hidden": hidden });
            }
            Mutation::SaveRequestAtNames {
                folder_names,
                draft,
                ..
            } => {
                let mut args = patch_args(draft);
                insert(&mut args, "folderNames", json!(folder_names));
                intent.args = args;
            }
        }
        intent
    }

    /// Decode into a typed mutation.
    ///
    /// Missing or ill-typed fields yield [`ErrorKind::MalformedIntent`](apinav_core::error::ErrorKind::MalformedIntent).
    pub fn to_mutation(&self) -> AppResult<Mutation> {
        let args = Args::new(&self.args)?;
        let mutation = match self.op.as_str() {
            "addCollection" => Mutation::AddCollection {
                name: args.name()?,
            },
            "renameCollection" => Mutation::RenameCollection {
                collection_id: self.collection()?,
                name: args.name()?,
            },
            "deleteCollection" => Mutation::DeleteCollection {
                collection_id: self.collection()?,
            },
            "duplicateCollection" => Mutation::DuplicateCollection {
                collection_id: self.collection()?,
            },
            "clearCollections" => Mutation::ClearCollections,
            "addFolder" => Mutation::AddFolder {
                collection_id: self.collection()?,
                path: self.folder_path.clone().unwrap_or_default(),
                name: args.name()?,
            },
            "renameFolder" => Mutation::RenameFolder {
                collection_id: self.collection()?,
                folder_id: args.folder_id()?,
                path: self.folder_path.clone(),
                name: args.name()?,
            },
            "deleteFolder" => Mutation::DeleteFolder {
                collection_id: self.collection()?,
                folder_id: args.folder_id()?,
                path: self.folder_path.clone(),
            },
            "duplicateFolder" => Mutation::DuplicateFolder {
                collection_id: self.collection()?,
                folder_id: args.folder_id()?,
                path: self.folder_path.clone(),
            },
            "addRequest" => Mutation::AddRequest {
                collection_id: self.collection()?,
                path: self.folder_path.clone().unwrap_or_default(),
                draft: args.patch()?,
            },
            "updateRequest" => Mutation::UpdateRequest {
                collection_id: self.collection()?,
                request_id: args.request_id()?,
                path: self.folder_path.clone(),
                patch: args.patch()?,
            },
            "renameRequest" => Mutation::RenameRequest {
                collection_id: self.collection()?,
                request_id: args.request_id()?,
                path: self.folder_path.clone(),
                name: args.name()?,
            },
            "deleteRequest" => Mutation::DeleteRequest {
                collection_id: self.collection()?,
                request_id: args.request_id()?,
                path: self.folder_path.clone(),
            },
            "duplicateRequest" => Mutation::DuplicateRequest {
                collection_id: self.collection()?,
                request_id: args.request_id()?,
                path: self.folder_path.clone(),
            },
            "setRequestHidden" => Mutation::SetRequestHidden {
                collection_id: self.collection()?,
                request_id: args.request_id()?,
                path: self.folder_path.clone(),
                hidden: args.boolean("hidden")?,
            },
            "saveRequestAtNames" => Mutation::SaveRequestAtNames {
                collection_id: self.collection()?,
                folder_names: args.string_list("folderNames")?,
                draft: args.patch()?,
            },
            other => {
                return Err(AppError::malformed_intent(format!("Unknown operation '{other}'")));
            }
        };
        Ok(mutation)
    }

    fn collection(&self) -> AppResult<CollectionId> {
        self.collection_id
            .clone()
            .ok_or_else(|| AppError::malformed_intent(format!("{} requires collectionId", self.op)))
    }
}

fn patch_args(patch: &RequestPatch) -> Value {
    serde_json::to_value(patch).unwrap_or_else(|_| Value::Object(Map::new()))
}

fn insert(args: &mut Value, key: &str, value: Value) {
    if let Value::Object(map) = args {
        map.insert(key.to_string(), value);
    }
}

/// Typed access to an intent's `args` object.
struct Args<'a> {
    map: Option<&'a Map<String, Value>>,
}

impl<'a> Args<'a> {
    fn new(args: &'a Value) -> AppResult<Self> {
        match args {
            Value::Null => Ok(Self { map: None }),
            Value::Object(map) => Ok(Self { map: Some(map) }),
            _ => Err(AppError::malformed_intent("args must be an object")),
        }
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.map.and_then(|m| m.get(key))
    }

    fn string(&self, key: &str) -> AppResult<String> {
        self.get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| AppError::malformed_intent(format!("args.{key} must be a string")))
    }

    /// `name`, falling back to the legacy `newName` key.
    fn name(&self) -> AppResult<String> {
        self.string("name").or_else(|_| self.string("newName"))
    }

    fn folder_id(&self) -> AppResult<FolderId> {
        self.string("folderId").map(FolderId::new)
    }

    fn request_id(&self) -> AppResult<RequestId> {
        self.string("requestId").map(RequestId::new)
    }

    fn boolean(&self, key: &str) -> AppResult<bool> {
        self.get(key)
            .and_then(Value::as_bool)
            .ok_or_else(|| AppError::malformed_intent(format!("args.{key} must be a boolean")))
    }

    fn string_list(&self, key: &str) -> AppResult<Vec<String>> {
        let Some(Value::Array(items)) = self.get(key) else {
            return Err(AppError::malformed_intent(format!("args.{key} must be an array")));
        };
        items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| AppError::malformed_intent(format!("args.{key} must hold strings")))
            })
            .collect()
    }

    /// Request fields, with addressing keys stripped.
    fn patch(&self) -> AppResult<RequestPatch> {
        let mut fields = self.map.cloned().unwrap_or_default();
        for key in CONTROL_KEYS {
            fields.remove(*key);
        }
        serde_json::from_value(Value::Object(fields))
            .map_err(|e| AppError::malformed_intent(format!("Invalid request fields: {e}")))
    }
}
