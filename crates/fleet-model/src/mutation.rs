use async_trait::async_trait;

use crate::{MutationError, SubmitResponse};

/// Host persistence callbacks for one resource type.
///
/// The core treats these as opaque: the commit executor calls `add` once per
/// valid row, row actions call `update` and `remove`. `Err` and a response
/// with `success == false` are both per-row failures.
#[async_trait]
pub trait Mutations<T: Send + Sync>: Send + Sync {
    async fn add(&self, record: &T) -> Result<SubmitResponse, MutationError>;

    async fn update(&self, _record: &T) -> Result<SubmitResponse, MutationError> {
        Err(MutationError::Unsupported {
            operation: "update",
        })
    }

    async fn remove(&self, _id: &str) -> Result<SubmitResponse, MutationError> {
        Err(MutationError::Unsupported {
            operation: "remove",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AddOnly;

    #[async_trait]
    impl Mutations<String> for AddOnly {
        async fn add(&self, record: &String) -> Result<SubmitResponse, MutationError> {
            Ok(SubmitResponse::accepted(format!("added {record}")))
        }
    }

    #[tokio::test]
    async fn update_and_remove_default_to_unsupported() {
        let sink = AddOnly;
        let added = sink.add(&"T-1".to_string()).await.unwrap();
        assert!(added.success);
        assert_eq!(
            sink.update(&"T-1".to_string()).await,
            Err(MutationError::Unsupported {
                operation: "update"
            })
        );
        assert_eq!(
            sink.remove("T-1").await,
            Err(MutationError::Unsupported {
                operation: "remove"
            })
        );
    }
}
