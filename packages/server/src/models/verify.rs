use serde::Serialize;
use utoipa::ToSchema;

use crate::explorer::VerificationStatus;

#[derive(Serialize, ToSchema)]
pub struct VerifySubmitResponse {
    /// Explorer job id to poll.
    #[schema(example = "x3ryqcqr1zdknhfhkimqmizlcqpxncqc6nrvp3pgrcpfsqedqi")]
    pub guid: String,
}

#[derive(Serialize, ToSchema)]
pub struct VerifyStatusResponse {
    pub guid: String,
    pub status: VerificationStatus,
    /// Raw message from the explorer.
    pub detail: String,
}
