//! In-process smoke test: one server, one client, same address

use crate::common::LatencyReport;
use crate::quic::{ClientConfig, QuicEchoClient, QuicEchoServer, ServerConfig, Verification};
use crate::{EchoError, Identity, Result};
use tracing::{error, info};

/// Starts a server in the background and immediately runs a client against it
///
/// There is no readiness signal between the two. The client's handshake
/// retransmits until the listener is up, and the warm-up round trip absorbs
/// whatever setup cost remains. A heavily loaded host can still lose that
/// race and surface a connect error.
pub async fn self_test(
    identity: Identity,
    server_config: ServerConfig,
    client_config: ClientConfig,
    message: &str,
    count: usize,
) -> Result<LatencyReport> {
    let address = server_config.bind_addr.clone();

    let server = tokio::spawn(async move {
        let server = QuicEchoServer::bind(server_config, &identity).await?;
        server.serve().await
    });

    let result = async {
        let mut client =
            QuicEchoClient::dial_with_config(address.clone(), Verification::SkipVerification, client_config)
                .await?;
        let report = client.run(message.as_bytes().to_vec(), count).await?;
        client.close().await;
        Ok::<_, EchoError>(report)
    }
    .await;

    // A server that already died explains a client failure better than the client error does
    if server.is_finished() {
        match server.await {
            Ok(Err(e)) => {
                error!(error = %e, "Self-test server failed");
                return Err(e);
            }
            Ok(Ok(())) => {}
            Err(e) => return Err(EchoError::Accept(format!("Self-test server task failed: {e}"))),
        }
    } else {
        server.abort();
    }

    let report = result?;
    info!(%address, count = report.count(), "Self-test complete");
    Ok(report)
}
