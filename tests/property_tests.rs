use netdog::EchoClient;
use netdog::common::{connect_test_client, create_controlled_test_server_with_limit};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Property: Echo server should return exactly the same data that was sent
    #[test]
    fn echo_preserves_data(data in prop::collection::vec(any::<u8>(), 0..16 * 1024)) {
        tokio_test::block_on(async {
            let (server_handle, addr) = create_controlled_test_server_with_limit(10).await
                .map_err(|e| TestCaseError::fail(format!("Server setup failed: {}", e)))?;

            let mut client = connect_test_client(addr).await
                .map_err(|e| TestCaseError::fail(format!("Client connection failed: {}", e)))?;

            let response = client.echo(&data).await
                .map_err(|e| TestCaseError::fail(format!("Echo failed: {}", e)))?;

            client.close().await;
            server_handle.abort();

            prop_assert_eq!(response, data);
            Ok(())
        })?;
    }

    /// Property: A run of N round trips reports exactly N samples
    #[test]
    fn run_reports_exactly_count_samples(
        text in "[a-z]{1,32}",
        count in 1usize..20,
    ) {
        tokio_test::block_on(async {
            let (server_handle, addr) = create_controlled_test_server_with_limit(10).await
                .map_err(|e| TestCaseError::fail(format!("Server setup failed: {}", e)))?;

            let mut client = connect_test_client(addr).await
                .map_err(|e| TestCaseError::fail(format!("Client connection failed: {}", e)))?;

            let report = client.run(text.clone().into_bytes(), count).await
                .map_err(|e| TestCaseError::fail(format!("Run failed: {}", e)))?;

            client.close().await;
            server_handle.abort();

            prop_assert_eq!(report.count(), count);
            prop_assert_eq!(report.last_response(), text.as_bytes());
            let mean = report.mean().map(|mean| mean.as_nanos());
            prop_assert_eq!(mean, Some(report.total().as_nanos() / count as u128));
            Ok(())
        })?;
    }

    /// Property: Consecutive messages on one stream never bleed into each other
    #[test]
    fn sequential_messages_stay_separate(
        messages in prop::collection::vec("[ -~]{1,64}", 1..8)
    ) {
        tokio_test::block_on(async {
            let (server_handle, addr) = create_controlled_test_server_with_limit(10).await
                .map_err(|e| TestCaseError::fail(format!("Server setup failed: {}", e)))?;

            let mut client = connect_test_client(addr).await
                .map_err(|e| TestCaseError::fail(format!("Client connection failed: {}", e)))?;

            for message in &messages {
                let response = client.echo_string(message).await
                    .map_err(|e| TestCaseError::fail(format!("Echo failed: {}", e)))?;
                prop_assert_eq!(&response, message);
            }

            client.close().await;
            server_handle.abort();
            Ok(())
        })?;
    }
}
