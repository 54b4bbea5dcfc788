//! Response bodies for the swap API.
//!
//! Every response carries a human-readable `msg`; submission adds the task
//! `id`, a finished swap adds the fetchable `result_url`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MessageBody {
    pub msg: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UploadAccepted {
    pub msg: String,
    pub id: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SwapReady {
    pub msg: String,
    pub result_url: String,
}
