/*
[INPUT]:  Prepared transactions (opaque txBytes) and a wallet signer
[OUTPUT]: Signed transactions submitted to the execute endpoint
[POS]:    HTTP layer - prepare/sign/execute pass-through
[UPDATE]: When the marketplace transaction endpoints change
*/

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use reqwest::Method;

use crate::auth::WalletSigner;
use crate::http::{PorticoError, PorticoClient, Result};
use crate::types::TxResponse;

/// A prepared transaction paired with its signature, ready to execute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTx {
    pub tx_id: String,
    pub tx_bytes: String,
    pub signature: String,
}

/// Sign a prepared transaction.
///
/// `tx_bytes` is base64 on the wire; the decoded bytes go to the signer
/// untouched. The client never interprets transaction contents.
pub async fn sign_prepared(tx: &TxResponse, signer: &dyn WalletSigner) -> Result<SignedTx> {
    let raw = BASE64
        .decode(&tx.tx_bytes)
        .map_err(|e| PorticoError::InvalidResponse(format!("txBytes is not valid base64: {e}")))?;

    let signature = signer.sign_transaction(&raw).await?;

    Ok(SignedTx {
        tx_id: tx.tx_id.clone(),
        tx_bytes: tx.tx_bytes.clone(),
        signature,
    })
}

impl PorticoClient {
    /// Call a marketplace prepare endpoint and return the prepared
    /// transaction
    pub async fn prepare_transaction(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<TxResponse> {
        self.request(Method::POST, path, Some(body)).await
    }

    /// Submit a signed transaction for execution
    pub async fn execute_transaction(&self, signed: &SignedTx) -> Result<serde_json::Value> {
        self.request(
            Method::POST,
            "/api/v1/transactions/execute",
            Some(serde_json::json!({
                "txId": signed.tx_id,
                "txBytes": signed.tx_bytes,
                "signature": signed.signature,
            })),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::auth::MockWalletSigner;

    fn prepared_tx() -> TxResponse {
        TxResponse {
            tx_id: "tx-1".to_string(),
            tx_bytes: BASE64.encode(b"raw-tx"),
            cost: 0.5,
            cost_token_symbol: "SUI".to_string(),
            gas_budget: 10_000_000,
        }
    }

    #[tokio::test]
    async fn test_sign_prepared_pairs_signature_with_original_tx() {
        let signer = MockWalletSigner::new("0xabc", "sig-1");
        let tx = prepared_tx();

        let signed = sign_prepared(&tx, &signer).await.unwrap();
        assert_eq!(signed.tx_id, "tx-1");
        assert_eq!(signed.tx_bytes, tx.tx_bytes);
        assert_eq!(signed.signature, "sig-1");
    }

    #[tokio::test]
    async fn test_sign_prepared_rejects_invalid_base64() {
        let signer = MockWalletSigner::new("0xabc", "sig-1");
        let mut tx = prepared_tx();
        tx.tx_bytes = "!!not-base64!!".to_string();

        let err = sign_prepared(&tx, &signer).await.unwrap_err();
        assert!(matches!(err, PorticoError::InvalidResponse(_)));
    }
}
