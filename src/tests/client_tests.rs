//! tests/client_tests.rs - JSON-RPC client against a mocked gateway

#[cfg(test)]
mod tests {
    use crate::{
        blockchain::client::{ChainClient, ClientError, EthClient},
        config::Config,
    };
    use mockito::{Matcher, Server};
    use num_bigint::BigUint;
    use serde_json::json;

    fn client_for(url: String) -> EthClient {
        let config = Config {
            gateway_url: url,
            rpc_timeout_secs: 5,
            ..Config::default()
        };
        EthClient::new(&config).expect("client should build")
    }

    #[tokio::test]
    async fn test_latest_block_number_decodes_hex() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({
                "jsonrpc": "2.0",
                "method": "eth_blockNumber",
                "params": []
            })))
            .with_header("content-type", "application/json")
            .with_status(200)
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":"0x10d4f"}"#)
            .create_async()
            .await;

        let client = client_for(server.url());
        let latest = client.latest_block_number().await.unwrap();

        assert_eq!(latest, BigUint::from(68943u32));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_block_by_number_requests_full_transactions() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({
                "method": "eth_getBlockByNumber",
                "params": ["0x2a", true]
            })))
            .with_header("content-type", "application/json")
            .with_status(200)
            .with_body(
                json!({
                    "jsonrpc": "2.0",
                    "id": 1,
                    "result": {
                        "number": "0x2a",
                        "hash": "0xblockhash",
                        "transactions": [
                            {
                                "hash": "0xt1",
                                "from": "0x00000000000000000000000000000000000000aa",
                                "to": "0x00000000000000000000000000000000000000bb",
                                "value": "0xde0b6b3a7640000",
                                "gas": "0x5208",
                                "gasPrice": "0x3b9aca00",
                                "blockNumber": "0x2a",
                                "blockHash": "0xblockhash"
                            },
                            {
                                "hash": "0xt2",
                                "from": "0x00000000000000000000000000000000000000cc",
                                "to": null,
                                "value": "0x0",
                                "gas": "0x100000",
                                "gasPrice": "0x1",
                                "blockNumber": "0x2a",
                                "blockHash": "0xblockhash"
                            }
                        ]
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = client_for(server.url());
        let block = client.block_by_number(&BigUint::from(42u32)).await.unwrap();

        assert_eq!(block.number, Some(BigUint::from(42u32)));
        assert_eq!(block.hash.as_deref(), Some("0xblockhash"));
        assert_eq!(block.transactions.len(), 2);
        assert_eq!(block.transactions[0].hash, "0xt1");
        assert_eq!(block.transactions[1].to, None);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_null_block_is_not_found() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":null}"#)
            .create_async()
            .await;

        let client = client_for(server.url());
        match client.block_by_number(&BigUint::from(7u32)).await {
            Err(ClientError::BlockNotFound(n)) => assert_eq!(n, BigUint::from(7u32)),
            other => panic!("Expected BlockNotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rpc_error_object_is_reported() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32005,"message":"limit exceeded"}}"#)
            .create_async()
            .await;

        let client = client_for(server.url());
        match client.latest_block_number().await {
            Err(ClientError::Rpc { code, message }) => {
                assert_eq!(code, -32005);
                assert_eq!(message, "limit exceeded");
            }
            other => panic!("Expected Rpc error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_result_is_malformed() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"jsonrpc":"2.0","id":1}"#)
            .create_async()
            .await;

        let client = client_for(server.url());
        let err = client.latest_block_number().await.unwrap_err();
        assert!(matches!(err, ClientError::MalformedResponse(_)), "got {:?}", err);
        assert!(err.to_string().contains("missing result"));
    }

    #[tokio::test]
    async fn test_non_json_body_is_malformed() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(200)
            .with_body("<html>bad gateway</html>")
            .create_async()
            .await;

        let client = client_for(server.url());
        let err = client.latest_block_number().await.unwrap_err();
        assert!(matches!(err, ClientError::MalformedResponse(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_invalid_hex_height_is_malformed() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":"12345"}"#)
            .create_async()
            .await;

        let client = client_for(server.url());
        let err = client.latest_block_number().await.unwrap_err();
        assert!(matches!(err, ClientError::MalformedResponse(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_block_with_wrong_shape_is_malformed() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":{"number":"0x1","transactions":[{"hash":"0x1"}]}}"#)
            .create_async()
            .await;

        let client = client_for(server.url());
        let err = client.block_by_number(&BigUint::from(1u32)).await.unwrap_err();
        assert!(matches!(err, ClientError::MalformedResponse(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_http_error_status_is_gateway_unavailable() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(503)
            .create_async()
            .await;

        let client = client_for(server.url());
        let err = client.latest_block_number().await.unwrap_err();
        assert!(matches!(err, ClientError::GatewayUnavailable(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_unreachable_gateway_is_unavailable() {
        let client = client_for("http://127.0.0.1:1".to_string());
        let err = client.latest_block_number().await.unwrap_err();
        assert!(matches!(err, ClientError::GatewayUnavailable(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_gateway_errors_do_not_leak_url_path() {
        let client = client_for("http://127.0.0.1:1/v3/secret-project-key".to_string());
        let err = client.latest_block_number().await.unwrap_err();
        assert!(matches!(err, ClientError::GatewayUnavailable(_)), "got {:?}", err);
        assert!(!err.to_string().contains("secret-project-key"), "{err}");
        assert!(!format!("{:?}", err).contains("secret-project-key"));
    }

    #[tokio::test]
    async fn test_rate_limited_client_still_answers() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":"0x1"}"#)
            .expect(3)
            .create_async()
            .await;

        let config = Config {
            gateway_url: server.url(),
            rpc_timeout_secs: 5,
            rpc_rate_limit: Some(1000),
            ..Config::default()
        };
        let client = EthClient::new(&config).unwrap();

        for _ in 0..3 {
            assert_eq!(client.latest_block_number().await.unwrap(), BigUint::from(1u32));
        }
        mock.assert_async().await;
    }
}
