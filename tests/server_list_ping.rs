//! Drives a real listener the way a client's server list does.

use maintenance_server::{
    config::ServerConfig,
    protocol::{
        packet::{client, server},
        Frame, PacketCodec,
    },
    server::Server,
    server_info::{ServerInfo, StatusResponse},
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

async fn start(config: ServerConfig) -> (SocketAddr, CancellationToken, JoinHandle<()>) {
    let info = Arc::new(ServerInfo::new(&config, None).unwrap());
    let server = Server::bind("127.0.0.1:0", info).await.unwrap();
    let address = server.local_addr().unwrap();
    let shutdown = CancellationToken::new();
    let task = tokio::spawn({
        let shutdown = shutdown.clone();
        async move { server.run(shutdown).await.unwrap() }
    });
    (address, shutdown, task)
}

fn handshake(next_state: i32) -> Vec<u8> {
    PacketCodec::new()
        .encode_packet(&client::handshake::Packet::from(
            client::handshake::Handshake {
                protocol_version: 4,
                server_address: "localhost".to_owned(),
                server_port: 25566,
                next_state,
            },
        ))
        .unwrap()
}

async fn read_frame(stream: &mut TcpStream, codec: &mut PacketCodec) -> Option<Frame> {
    let mut buffer = [0u8; 256];
    loop {
        if let Some(frame) = codec.next_frame().unwrap() {
            return Some(frame);
        }
        let bytes_read = stream.read(&mut buffer).await.unwrap();
        if bytes_read == 0 {
            return None;
        }
        codec.give_data(&buffer[..bytes_read]);
    }
}

#[tokio::test]
async fn status_then_ping() {
    let (address, shutdown, task) = start(ServerConfig::default()).await;
    let mut stream = TcpStream::connect(address).await.unwrap();
    let mut codec = PacketCodec::new();

    stream.write_all(&handshake(1)).await.unwrap();
    let frame = read_frame(&mut stream, &mut codec).await.unwrap();
    let server::status::Packet::StatusResponse(response) =
        frame.decode_packet::<server::status::Packet>().unwrap()
    else {
        panic!("expected a status response");
    };
    assert_eq!(
        response.json,
        r#"{"version":{"name":"MaintenanceServer","protocol":-1},"players":{"max":0,"online":0},"description":{"text":"A Maintenance Server!"}}"#
    );

    let ping = PacketCodec::new()
        .encode_packet(&client::status::Packet::from(client::status::PingRequest {
            payload: 0x0000_0000_0000_0007,
        }))
        .unwrap();
    stream.write_all(&ping).await.unwrap();
    let frame = read_frame(&mut stream, &mut codec).await.unwrap();
    assert_eq!(frame.id(), 0x01);
    assert_eq!(frame.body(), &7i64.to_be_bytes());

    drop(stream);
    shutdown.cancel();
    task.await.unwrap();
}

#[tokio::test]
async fn login_is_refused() {
    let config = ServerConfig {
        kick_message: "Down for maintenance".to_owned(),
        ..ServerConfig::default()
    };
    let (address, shutdown, task) = start(config).await;
    let mut stream = TcpStream::connect(address).await.unwrap();
    let mut codec = PacketCodec::new();

    stream.write_all(&handshake(2)).await.unwrap();
    let frame = read_frame(&mut stream, &mut codec).await.unwrap();
    let server::login::Packet::Disconnect(disconnect) =
        frame.decode_packet::<server::login::Packet>().unwrap();
    assert_eq!(disconnect.reason, r#"{"text":"Down for maintenance"}"#);
    assert!(read_frame(&mut stream, &mut codec).await.is_none());

    shutdown.cancel();
    task.await.unwrap();
}

#[tokio::test]
async fn connections_are_isolated() {
    let (address, shutdown, task) = start(ServerConfig::default()).await;

    let mut bad = TcpStream::connect(address).await.unwrap();
    bad.write_all(&handshake(99)).await.unwrap();
    assert!(read_frame(&mut bad, &mut PacketCodec::new()).await.is_none());

    let mut good = TcpStream::connect(address).await.unwrap();
    good.write_all(&handshake(1)).await.unwrap();
    let frame = read_frame(&mut good, &mut PacketCodec::new()).await.unwrap();
    let response: StatusResponse = match frame.decode_packet::<server::status::Packet>().unwrap() {
        server::status::Packet::StatusResponse(response) => {
            serde_json::from_str(&response.json).unwrap()
        }
        other => panic!("unexpected {other:?}"),
    };
    assert_eq!(response.description.text, "A Maintenance Server!");

    shutdown.cancel();
    task.await.unwrap();
}

#[tokio::test]
async fn shutdown_closes_idle_connections() {
    let (address, shutdown, task) = start(ServerConfig::default()).await;
    let mut stream = TcpStream::connect(address).await.unwrap();
    let mut codec = PacketCodec::new();

    stream.write_all(&handshake(1)).await.unwrap();
    assert!(read_frame(&mut stream, &mut codec).await.is_some());

    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(10), task)
        .await
        .expect("server did not stop")
        .unwrap();
    assert!(read_frame(&mut stream, &mut codec).await.is_none());
}
