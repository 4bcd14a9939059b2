//! Integration tests for the WebSocket transport.
//!
//! A real listener on an OS-assigned port and a real `tokio-tungstenite`
//! client on the other end.

#[cfg(feature = "websocket")]
mod websocket {
    use std::sync::Arc;
    use std::time::Duration;

    use futures_util::{SinkExt, StreamExt};
    use lycan_transport::{Connection, Transport, WebSocketConnection, WebSocketTransport};
    use tokio_tungstenite::tungstenite::Message;

    type Client = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    async fn pair() -> (WebSocketConnection, Client) {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().expect("bound address");

        let server = tokio::spawn(async move { transport.accept().await.expect("should accept") });
        let (client, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .expect("client should connect");
        (server.await.expect("accept task"), client)
    }

    #[tokio::test]
    async fn test_websocket_send_arrives_as_text_frame() {
        let (server, mut client) = pair().await;
        assert!(server.id().into_inner() > 0);

        server.send(br#"{"type":"Bye"}"#).await.expect("send");

        let msg = client.next().await.unwrap().unwrap();
        assert!(msg.is_text());
        assert_eq!(msg.into_text().unwrap().as_str(), r#"{"type":"Bye"}"#);
    }

    #[tokio::test]
    async fn test_websocket_recv_accepts_text_and_binary() {
        let (server, mut client) = pair().await;

        client.send(Message::Text("hello".into())).await.unwrap();
        client
            .send(Message::Binary(b"world".to_vec().into()))
            .await
            .unwrap();

        assert_eq!(server.recv().await.unwrap().unwrap(), b"hello");
        assert_eq!(server.recv().await.unwrap().unwrap(), b"world");
    }

    #[tokio::test]
    async fn test_websocket_send_is_not_blocked_by_pending_recv() {
        let (server, mut client) = pair().await;
        let server = Arc::new(server);

        let reader = {
            let server = Arc::clone(&server);
            tokio::spawn(async move { server.recv().await })
        };
        // Let the reader park inside recv.
        tokio::time::sleep(Duration::from_millis(20)).await;

        tokio::time::timeout(Duration::from_secs(2), server.send(b"narration"))
            .await
            .expect("send must not wait for recv")
            .expect("send");
        let msg = client.next().await.unwrap().unwrap();
        assert_eq!(msg.into_data().as_ref(), b"narration");

        client.send(Message::Close(None)).await.unwrap();
        let got = reader.await.unwrap().expect("recv should not error");
        assert!(got.is_none());
    }

    #[tokio::test]
    async fn test_websocket_rejects_non_utf8_payload() {
        let (server, _client) = pair().await;
        let err = server.send(&[0xff, 0xfe]).await.unwrap_err();
        assert!(matches!(err, lycan_transport::TransportError::NotUtf8));
    }
}
