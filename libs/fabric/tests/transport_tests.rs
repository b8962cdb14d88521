use boot_fabric::{
    channel::Channel,
    codec::BencodeCodec,
    error::{Error, Phase},
    request::request_tcp,
    transport::{TcpTransport, TcpTransportListener, Transport, TransportListener},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::io::AsyncWriteExt;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct TestMessage {
    id: u32,
    data: String,
}

/// Helper to get a free port
async fn get_listener() -> (TcpTransportListener, String) {
    let listener = TcpTransportListener::bind("127.0.0.1:0".parse().unwrap())
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    (listener, addr)
}

/// Raw server that writes `bytes` to the first client, then holds or drops it
async fn raw_server(bytes: &'static [u8], hold: Duration) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        stream.write_all(bytes).await.unwrap();
        stream.flush().await.unwrap();
        tokio::time::sleep(hold).await;
    });

    addr
}

#[tokio::test]
async fn tcp_send_receive_single_message() {
    let (listener, addr) = get_listener().await;

    // Spawn server
    tokio::spawn(async move {
        let (mut transport, _addr) = listener.accept().await.unwrap();
        let received = transport.receive().await.unwrap();
        transport.send(&received).await.unwrap(); // Echo back
    });

    // Client
    let mut client = TcpTransport::connect(addr).await.unwrap();
    let msg = b"d5:hello5:worlde";
    client.send(msg).await.unwrap();
    let response = client.receive().await.unwrap();

    assert_eq!(response, msg);
}

#[tokio::test]
async fn tcp_back_to_back_values_preserve_boundaries() {
    let addr = raw_server(b"i1el1:ae4:spamd1:ai2ee", Duration::from_secs(1)).await;

    let mut client = TcpTransport::connect(addr).await.unwrap();
    let expected: [&[u8]; 4] = [b"i1e", b"l1:ae", b"4:spam", b"d1:ai2ee"];

    for frame in expected {
        assert_eq!(client.receive().await.unwrap(), frame);
    }
}

#[tokio::test]
async fn tcp_receive_timeout_fires() {
    let (listener, addr) = get_listener().await;

    // Spawn server that never responds
    tokio::spawn(async move {
        let (_transport, _addr) = listener.accept().await.unwrap();
        // Just hold connection open, never send
        tokio::time::sleep(Duration::from_secs(10)).await;
    });

    // Client with short receive timeout
    let mut client = TcpTransport::builder()
        .address(addr)
        .receive_timeout(Duration::from_millis(100))
        .connect()
        .await
        .unwrap();

    client.send(b"5:hello").await.unwrap();

    // Should timeout
    match client.receive().await {
        Err(Error::Timeout(Phase::Receive)) => {}
        other => panic!("Expected receive timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn tcp_rejects_oversized_frame() {
    // Length prefix claiming 200MB, over the 100MB default limit
    let addr = raw_server(b"209715200:", Duration::from_secs(2)).await;

    let mut client = TcpTransport::connect(addr).await.unwrap();

    match client.receive().await {
        Err(Error::InvalidFrame(msg)) => assert!(msg.contains("too large")),
        other => panic!("Expected InvalidFrame error, got {:?}", other),
    }
}

#[tokio::test]
async fn tcp_rejects_frame_over_configured_limit() {
    let addr = raw_server(b"l5:abcde5:fghije", Duration::from_secs(1)).await;

    let mut client = TcpTransport::builder()
        .address(addr)
        .max_frame_len(10)
        .connect()
        .await
        .unwrap();

    match client.receive().await {
        Err(Error::InvalidFrame(msg)) => assert!(msg.contains("too large")),
        other => panic!("Expected InvalidFrame error, got {:?}", other),
    }
}

#[tokio::test]
async fn tcp_truncated_value_is_invalid_frame() {
    // Declares 10 bytes, sends 3, then hangs up
    let addr = raw_server(b"10:abc", Duration::ZERO).await;

    let mut client = TcpTransport::connect(addr).await.unwrap();

    match client.receive().await {
        Err(Error::InvalidFrame(msg)) => assert!(msg.contains("mid-value")),
        other => panic!("Expected InvalidFrame error, got {:?}", other),
    }
}

#[tokio::test]
async fn tcp_large_declared_length_with_short_body_is_invalid_frame() {
    // Claims 50MB, under the limit, but only 3 bytes ever arrive
    let addr = raw_server(b"50000000:abc", Duration::ZERO).await;

    let mut client = TcpTransport::connect(addr).await.unwrap();

    match client.receive().await {
        Err(Error::InvalidFrame(msg)) => {
            assert!(msg.contains("mid-value"));
            assert!(msg.contains("after 12 bytes"));
        }
        other => panic!("Expected InvalidFrame error, got {:?}", other),
    }
}

#[tokio::test]
async fn tcp_rejects_garbage_lead_byte() {
    let addr = raw_server(b"HTTP/1.1 400\r\n", Duration::from_secs(1)).await;

    let mut client = TcpTransport::connect(addr).await.unwrap();

    match client.receive().await {
        Err(Error::InvalidFrame(msg)) => assert!(msg.contains("unexpected byte")),
        other => panic!("Expected InvalidFrame error, got {:?}", other),
    }
}

#[tokio::test]
async fn channel_with_codec_roundtrip() {
    let (listener, addr) = get_listener().await;

    let expected_msg = TestMessage {
        id: 42,
        data: "test data".to_string(),
    };
    let expected_clone = expected_msg.clone();

    // Spawn server
    tokio::spawn(async move {
        let (transport, _addr) = listener.accept().await.unwrap();
        let mut channel = Channel::from_transport(transport, BencodeCodec);

        let msg: TestMessage = channel.receive().await.unwrap();
        channel.send(&msg).await.unwrap(); // Echo back
    });

    // Client
    let transport = TcpTransport::connect(addr).await.unwrap();
    let mut channel = Channel::from_transport(transport, BencodeCodec);

    channel.send(&expected_msg).await.unwrap();
    let response: TestMessage = channel.receive().await.unwrap();

    assert_eq!(response, expected_clone);
}

#[tokio::test]
async fn request_tcp_one_off() {
    let (listener, addr) = get_listener().await;

    tokio::spawn(async move {
        let (transport, _addr) = listener.accept().await.unwrap();
        let mut channel = Channel::from_transport(transport, BencodeCodec);
        let mut msg: TestMessage = channel.receive().await.unwrap();
        msg.id += 1;
        channel.send(&msg).await.unwrap();
    });

    let request = TestMessage {
        id: 1,
        data: "ping".to_string(),
    };
    let response: TestMessage = request_tcp(addr, &request, BencodeCodec).await.unwrap();

    assert_eq!(response.id, 2);
    assert_eq!(response.data, "ping");
}

#[tokio::test]
async fn connection_closed_error() {
    let (listener, addr) = get_listener().await;

    // Spawn server that immediately closes
    tokio::spawn(async move {
        let (mut transport, _addr) = listener.accept().await.unwrap();
        transport.close().await.unwrap();
    });

    // Client tries to receive from closed connection
    let mut client = TcpTransport::connect(addr).await.unwrap();

    // Give server time to close
    tokio::time::sleep(Duration::from_millis(50)).await;

    match client.receive().await {
        Err(Error::ConnectionClosed) => {}
        other => panic!("Expected ConnectionClosed, got {:?}", other),
    }
}

#[tokio::test]
async fn connect_refused_reports_address() {
    // Bind then drop to find a port with nothing listening
    let (listener, addr) = get_listener().await;
    drop(listener);

    match TcpTransport::connect(addr.clone()).await {
        Err(Error::Connect { address, .. }) => assert_eq!(address, addr),
        Err(e) => panic!("Expected Connect error, got {:?}", e),
        Ok(_) => panic!("Expected Connect error, got a connection"),
    }
}

#[tokio::test]
async fn connect_unresolvable_address_is_connect_error() {
    match TcpTransport::connect("no-port-here").await {
        Err(Error::Connect { address, .. }) => assert_eq!(address, "no-port-here"),
        Err(e) => panic!("Expected Connect error, got {:?}", e),
        Ok(_) => panic!("Expected Connect error, got a connection"),
    }
}

#[tokio::test]
async fn builder_without_address_fails() {
    match TcpTransport::builder().connect().await {
        Err(Error::Custom(msg)) => assert!(msg.contains("Address not set")),
        Err(e) => panic!("Expected Custom error, got {:?}", e),
        Ok(_) => panic!("Expected Custom error, got a connection"),
    }
}

#[tokio::test]
async fn transport_listener_trait_usage() {
    let (listener, addr) = get_listener().await;

    // Test that we can use TransportListener trait generically
    async fn accept_generic<L: TransportListener>(listener: &L) -> Result<L::Transport, Error> {
        listener.accept().await
    }

    // Spawn client
    tokio::spawn(async move {
        let mut client = TcpTransport::connect(addr).await.unwrap();
        client.send(b"4:test").await.unwrap();
    });

    // Use generic function
    let mut transport = accept_generic(&listener).await.unwrap();
    let msg = transport.receive().await.unwrap();
    assert_eq!(msg, b"4:test");
}
