use tracing::{info, warn};

use crate::{error::Result, session::SessionClient, voucher::AccessCode};

/// Maximum number of codes included in one reply.
pub const MAX_CODES: usize = 5;

/// Reply sent when the controller has no vouchers.
pub const NO_VOUCHERS: &str = "No vouchers found";

/// Fetches vouchers and renders them as a chat reply.
pub struct VoucherService {
    session: SessionClient,
}

impl VoucherService {
    pub fn new(session: SessionClient) -> Self {
        Self { session }
    }

    /// Fetch vouchers and build the reply text. Failures become the reply
    /// text instead of an error.
    pub async fn top_codes(&mut self) -> String {
        info!("voucher request");
        let result = self.session.fetch_access_codes().await;
        match &result {
            Ok(codes) => info!(
                total = codes.len(),
                returned = codes.len().min(MAX_CODES),
                "vouchers retrieved"
            ),
            Err(e) => warn!(error = %e, "voucher fetch failed"),
        }
        format_reply(&result)
    }
}

/// Render a fetch result: the error message, [`NO_VOUCHERS`], or the first
/// [`MAX_CODES`] codes one per line in the order received.
pub fn format_reply(result: &Result<Vec<AccessCode>>) -> String {
    match result {
        Err(e) => e.to_string(),
        Ok(codes) if codes.is_empty() => NO_VOUCHERS.to_string(),
        Ok(codes) => codes
            .iter()
            .take(MAX_CODES)
            .map(|c| c.code.as_str())
            .collect::<Vec<_>>()
            .join("\n"),
    }
}
