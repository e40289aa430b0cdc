use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(example = json!({ "id": 1, "name": "Alice" }))]
pub struct Employee {
    #[schema(example = 1)]
    pub id: i64,

    #[schema(example = "Alice")]
    pub name: String,
}
