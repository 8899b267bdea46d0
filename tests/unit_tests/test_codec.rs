// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use anyhow::Result;
use lottery_server_rs::{
    codec::recv::{FrameReader, Inbound},
    models::error::ProtocolError,
};

/// Builds one frame: opcode, little-endian body length, body bytes.
fn frame(opcode: u8, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(5 + body.len());
    out.push(opcode);
    out.extend_from_slice(&(body.len() as i32).to_le_bytes());
    out.extend_from_slice(body);
    out
}

/// Frame with an explicit (possibly lying) length field.
fn frame_with_length(opcode: u8, length: i32, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(5 + body.len());
    out.push(opcode);
    out.extend_from_slice(&length.to_le_bytes());
    out.extend_from_slice(body);
    out
}

fn put_i32(buf: &mut Vec<u8>, v: i32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn put_str(buf: &mut Vec<u8>, s: &str) {
    put_i32(buf, s.len() as i32);
    buf.extend_from_slice(s.as_bytes());
}

fn put_pair(buf: &mut Vec<u8>, k: &str, v: &str) {
    put_str(buf, k);
    put_str(buf, v);
}

/// A well-formed six-pair bet body.
fn put_bet(buf: &mut Vec<u8>, agency: &str, document: &str, number: &str) {
    put_i32(buf, 6);
    put_pair(buf, "AGENCIA", agency);
    put_pair(buf, "NOMBRE", "Santiago Lionel");
    put_pair(buf, "APELLIDO", "Lorca");
    put_pair(buf, "DOCUMENTO", document);
    put_pair(buf, "NACIMIENTO", "1999-03-17");
    put_pair(buf, "NUMERO", number);
}

fn new_bets_frame(bets: &[(&str, &str, &str)]) -> Vec<u8> {
    let mut body = Vec::new();
    put_i32(&mut body, bets.len() as i32);
    for (agency, document, number) in bets {
        put_bet(&mut body, agency, document, number);
    }
    frame(0, &body)
}

fn finished_frame(agency_id: i32) -> Vec<u8> {
    frame(3, &agency_id.to_le_bytes())
}

#[tokio::test]
async fn decodes_single_bet_batch_and_consumes_exact_body() -> Result<()> {
    let bytes = new_bets_frame(&[("1", "30904465", "7574")]);
    let mut reader = FrameReader::new(&bytes[..]);

    let Some(Inbound::NewBets(batch)) = reader.recv_msg().await? else {
        panic!("expected NEW_BETS");
    };
    assert_eq!(batch.amount, 1);
    assert_eq!(batch.bets.len(), 1);
    let bet = &batch.bets[0];
    assert_eq!(bet.agency, "1");
    assert_eq!(bet.first_name, "Santiago Lionel");
    assert_eq!(bet.last_name, "Lorca");
    assert_eq!(bet.document, "30904465");
    assert_eq!(bet.birthdate, "1999-03-17");
    assert_eq!(bet.number, "7574");

    // Nothing left over: the next read sees a clean EOF.
    assert!(reader.recv_msg().await?.is_none());
    Ok(())
}

#[tokio::test]
async fn decodes_empty_batch() -> Result<()> {
    let bytes = new_bets_frame(&[]);
    let mut reader = FrameReader::new(&bytes[..]);

    let Some(Inbound::NewBets(batch)) = reader.recv_msg().await? else {
        panic!("expected NEW_BETS");
    };
    assert_eq!(batch.amount, 0);
    assert!(batch.bets.is_empty());
    Ok(())
}

#[tokio::test]
async fn preserves_wire_order_within_a_batch() -> Result<()> {
    let bytes = new_bets_frame(&[
        ("1", "11111111", "1"),
        ("1", "22222222", "2"),
        ("1", "33333333", "3"),
    ]);
    let mut reader = FrameReader::new(&bytes[..]);

    let Some(Inbound::NewBets(batch)) = reader.recv_msg().await? else {
        panic!("expected NEW_BETS");
    };
    let documents: Vec<&str> =
        batch.bets.iter().map(|b| b.document.as_str()).collect();
    assert_eq!(documents, vec!["11111111", "22222222", "33333333"]);
    Ok(())
}

#[tokio::test]
async fn rejects_negative_frame_length() {
    let bytes = frame_with_length(0, -1, &[]);
    let mut reader = FrameReader::new(&bytes[..]);
    assert!(matches!(
        reader.recv_msg().await,
        Err(ProtocolError::InvalidLength)
    ));
}

#[tokio::test]
async fn rejects_unknown_opcode() {
    let bytes = frame(9, &[]);
    let mut reader = FrameReader::new(&bytes[..]);
    assert!(matches!(
        reader.recv_msg().await,
        Err(ProtocolError::InvalidOpcode(9))
    ));
}

#[tokio::test]
async fn rejects_server_to_client_opcode_inbound() {
    let bytes = frame(1, &[]);
    let mut reader = FrameReader::new(&bytes[..]);
    assert!(matches!(
        reader.recv_msg().await,
        Err(ProtocolError::InvalidOpcode(1))
    ));
}

#[tokio::test]
async fn finished_requires_a_four_byte_body() -> Result<()> {
    let bytes = frame(3, &[0x01, 0x00, 0x00]);
    let mut reader = FrameReader::new(&bytes[..]);
    assert!(matches!(
        reader.recv_msg().await,
        Err(ProtocolError::InvalidLength)
    ));

    let bytes = finished_frame(7);
    let mut reader = FrameReader::new(&bytes[..]);
    let Some(Inbound::Finished(msg)) = reader.recv_msg().await? else {
        panic!("expected FINISHED");
    };
    assert_eq!(msg.agency_id, 7);
    Ok(())
}

#[tokio::test]
async fn request_winners_decodes_agency_id() -> Result<()> {
    let bytes = frame(4, &42i32.to_le_bytes());
    let mut reader = FrameReader::new(&bytes[..]);
    let Some(Inbound::RequestWinners(msg)) = reader.recv_msg().await? else {
        panic!("expected REQUEST_WINNERS");
    };
    assert_eq!(msg.agency_id, 42);
    Ok(())
}

#[tokio::test]
async fn wrong_pair_count_drains_body_and_keeps_stream_aligned() -> Result<()> {
    // One bet announcing 5 pairs: invalid immediately, with filler bytes the
    // announced length still covers.
    let mut body = Vec::new();
    put_i32(&mut body, 1);
    put_i32(&mut body, 5);
    body.extend_from_slice(&[0xAA; 10]);

    let mut bytes = frame(0, &body);
    bytes.extend_from_slice(&finished_frame(3));

    let mut reader = FrameReader::new(&bytes[..]);
    assert!(matches!(
        reader.recv_msg().await,
        Err(ProtocolError::InvalidBody)
    ));

    // The filler was drained, so the next frame decodes cleanly.
    let Some(Inbound::Finished(msg)) = reader.recv_msg().await? else {
        panic!("expected FINISHED after drain");
    };
    assert_eq!(msg.agency_id, 3);
    Ok(())
}

#[tokio::test]
async fn leftover_body_bytes_are_a_length_mismatch_and_get_drained() -> Result<()> {
    // n_bets = 0 but three trailing bytes the length still announces.
    let mut body = Vec::new();
    put_i32(&mut body, 0);
    body.extend_from_slice(&[0x00, 0x00, 0x00]);

    let mut bytes = frame(0, &body);
    bytes.extend_from_slice(&finished_frame(1));

    let mut reader = FrameReader::new(&bytes[..]);
    assert!(matches!(
        reader.recv_msg().await,
        Err(ProtocolError::LengthMismatch)
    ));

    let Some(Inbound::Finished(msg)) = reader.recv_msg().await? else {
        panic!("expected FINISHED after drain");
    };
    assert_eq!(msg.agency_id, 1);
    Ok(())
}

#[tokio::test]
async fn zero_length_string_is_invalid_body() {
    let mut body = Vec::new();
    put_i32(&mut body, 1);
    put_i32(&mut body, 6);
    put_i32(&mut body, 0); // key length 0

    let bytes = frame(0, &body);
    let mut reader = FrameReader::new(&bytes[..]);
    assert!(matches!(
        reader.recv_msg().await,
        Err(ProtocolError::InvalidBody)
    ));
}

#[tokio::test]
async fn string_longer_than_body_is_a_length_mismatch() {
    let mut body = Vec::new();
    put_i32(&mut body, 1);
    put_i32(&mut body, 6);
    put_i32(&mut body, 100); // key claims 100 bytes, body has none left

    let bytes = frame(0, &body);
    let mut reader = FrameReader::new(&bytes[..]);
    assert!(matches!(
        reader.recv_msg().await,
        Err(ProtocolError::LengthMismatch)
    ));
}

#[tokio::test]
async fn non_utf8_string_is_invalid_body() {
    let mut body = Vec::new();
    put_i32(&mut body, 1);
    put_i32(&mut body, 6);
    put_i32(&mut body, 2);
    body.extend_from_slice(&[0xFF, 0xFE]);

    let bytes = frame(0, &body);
    let mut reader = FrameReader::new(&bytes[..]);
    assert!(matches!(
        reader.recv_msg().await,
        Err(ProtocolError::InvalidBody)
    ));
}

#[tokio::test]
async fn missing_required_key_is_invalid_body() {
    let mut body = Vec::new();
    put_i32(&mut body, 1);
    put_i32(&mut body, 6);
    put_pair(&mut body, "AGENCIA", "1");
    put_pair(&mut body, "NOMBRE", "Santiago");
    put_pair(&mut body, "APELLIDO", "Lorca");
    put_pair(&mut body, "DOCUMENTO", "30904465");
    put_pair(&mut body, "NACIMIENTO", "1999-03-17");
    put_pair(&mut body, "TELEFONO", "5555"); // NUMERO missing

    let bytes = frame(0, &body);
    let mut reader = FrameReader::new(&bytes[..]);
    assert!(matches!(
        reader.recv_msg().await,
        Err(ProtocolError::InvalidBody)
    ));
}

#[tokio::test]
async fn truncated_frame_is_peer_closed() {
    // Announces a 100-byte body, then the stream ends.
    let bytes = frame_with_length(0, 100, &[]);
    let mut reader = FrameReader::new(&bytes[..]);
    assert!(matches!(
        reader.recv_msg().await,
        Err(ProtocolError::PeerClosed)
    ));
}

#[tokio::test]
async fn eof_at_frame_boundary_is_not_an_error() -> Result<()> {
    let mut reader = FrameReader::new(&[][..]);
    assert!(reader.recv_msg().await?.is_none());
    Ok(())
}
