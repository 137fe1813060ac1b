//! Binary wire protocol.
//!
//! Every message is one opcode-prefixed buffer; all multi-byte integers are
//! big-endian (network byte order). World state travels as packed 9-byte
//! particle records:
//!
//! ```text
//! offset  0    1     2      3..5   5..7   7..9
//! field   id   type  color  x      y      radius
//! ```
//!
//! Coordinates are floored to u16, which limits map dimensions and positions
//! to below 65536; out-of-range values saturate.
//!
//! Server -> client: init(0), start-ack(1), chat(2), world-update(3),
//! new-player(4). Client -> server: start(0), control(1), chat(2).

#![allow(dead_code)] // the decode half of the codec is client-facing

use crate::config::WorldConfig;
use crate::game::constants::net::PARTICLE_RECORD_SIZE;
use crate::game::entity::{Control, Entity};
use crate::util::vec2::Vec2;

/// Server-to-client opcodes
pub mod server_opcode {
    pub const INIT: u8 = 0;
    pub const START_ACK: u8 = 1;
    pub const CHAT: u8 = 2;
    pub const UPDATE: u8 = 3;
    pub const NEW_PLAYER: u8 = 4;
}

/// Client-to-server opcodes
pub mod client_opcode {
    pub const START: u8 = 0;
    pub const CONTROL: u8 = 1;
    pub const CHAT: u8 = 2;
}

/// init header: opcode, pid, map w/h, view w/h
const INIT_HEADER_SIZE: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("empty message")]
    Empty,
    #[error("unknown opcode {0}")]
    UnknownOpcode(u8),
    #[error("opcode {opcode} payload has invalid length {len}")]
    BadPayload { opcode: u8, len: usize },
    #[error("chat text is not valid UTF-8")]
    InvalidUtf8,
    #[error("record array length {0} is not a multiple of 9")]
    BadRecordLength(usize),
}

/// A decoded inbound command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    Start { name: String },
    Control(Control),
    Chat(String),
}

/// Decode one client message. Malformed input is an error for the caller to
/// log and drop; it never tears down the connection.
pub fn decode_command(buf: &[u8], name_max_bytes: usize) -> Result<ClientCommand, ProtocolError> {
    let (&opcode, payload) = buf.split_first().ok_or(ProtocolError::Empty)?;
    match opcode {
        client_opcode::START => Ok(ClientCommand::Start {
            name: sanitize_name(payload, name_max_bytes),
        }),
        client_opcode::CONTROL => {
            if payload.len() != 1 {
                return Err(ProtocolError::BadPayload {
                    opcode,
                    len: buf.len(),
                });
            }
            Ok(ClientCommand::Control(Control::from_bits(payload[0])))
        }
        client_opcode::CHAT => {
            let text = std::str::from_utf8(payload).map_err(|_| ProtocolError::InvalidUtf8)?;
            Ok(ClientCommand::Chat(text.to_string()))
        }
        other => Err(ProtocolError::UnknownOpcode(other)),
    }
}

/// Truncate a requested name to the byte budget on a char boundary; blank
/// names fall back to "default"
pub fn sanitize_name(bytes: &[u8], max_bytes: usize) -> String {
    let decoded = String::from_utf8_lossy(bytes);
    let mut name = String::new();
    for c in decoded.chars() {
        if name.len() + c.len_utf8() > max_bytes {
            break;
        }
        name.push(c);
    }
    if name.is_empty() {
        "default".to_string()
    } else {
        name
    }
}

/// One packed particle record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParticleRecord {
    pub id: u8,
    pub kind: u8,
    pub color: u8,
    pub x: u16,
    pub y: u16,
    pub radius: u16,
}

impl ParticleRecord {
    pub fn from_entity(e: &Entity) -> Self {
        Self {
            id: e.id,
            kind: e.kind.code(),
            color: e.color,
            x: e.position.x.floor() as u16,
            y: e.position.y.floor() as u16,
            radius: e.radius.floor() as u16,
        }
    }

    pub fn write_at(&self, buf: &mut [u8], offset: usize) {
        buf[offset] = self.id;
        buf[offset + 1] = self.kind;
        buf[offset + 2] = self.color;
        buf[offset + 3..offset + 5].copy_from_slice(&self.x.to_be_bytes());
        buf[offset + 5..offset + 7].copy_from_slice(&self.y.to_be_bytes());
        buf[offset + 7..offset + 9].copy_from_slice(&self.radius.to_be_bytes());
    }

    pub fn read_at(buf: &[u8], offset: usize) -> Self {
        Self {
            id: buf[offset],
            kind: buf[offset + 1],
            color: buf[offset + 2],
            x: u16::from_be_bytes([buf[offset + 3], buf[offset + 4]]),
            y: u16::from_be_bytes([buf[offset + 5], buf[offset + 6]]),
            radius: u16::from_be_bytes([buf[offset + 7], buf[offset + 8]]),
        }
    }
}

/// Full world snapshot plus map geometry and the client's assigned pid
pub fn encode_init(pid: u8, config: &WorldConfig, entities: &[Entity]) -> Vec<u8> {
    let mut buf = vec![0u8; INIT_HEADER_SIZE + entities.len() * PARTICLE_RECORD_SIZE];
    buf[0] = server_opcode::INIT;
    buf[1] = pid;
    buf[2..4].copy_from_slice(&(config.map_width.floor() as u16).to_be_bytes());
    buf[4..6].copy_from_slice(&(config.map_height.floor() as u16).to_be_bytes());
    buf[6..8].copy_from_slice(&(config.view_width.floor() as u16).to_be_bytes());
    buf[8..10].copy_from_slice(&(config.view_height.floor() as u16).to_be_bytes());
    for (i, e) in entities.iter().enumerate() {
        ParticleRecord::from_entity(e)
            .write_at(&mut buf, INIT_HEADER_SIZE + i * PARTICLE_RECORD_SIZE);
    }
    buf
}

pub fn encode_start_ack() -> Vec<u8> {
    vec![server_opcode::START_ACK]
}

pub fn encode_chat(sender: u8, text: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(2 + text.len());
    buf.push(server_opcode::CHAT);
    buf.push(sender);
    buf.extend_from_slice(text.as_bytes());
    buf
}

/// Snapshot of the given entities; no count prefix, the payload length is
/// the record count times nine
pub fn encode_update(entities: &[&Entity]) -> Vec<u8> {
    let mut buf = vec![0u8; 1 + entities.len() * PARTICLE_RECORD_SIZE];
    buf[0] = server_opcode::UPDATE;
    for (i, e) in entities.iter().enumerate() {
        ParticleRecord::from_entity(e).write_at(&mut buf, 1 + i * PARTICLE_RECORD_SIZE);
    }
    buf
}

pub fn encode_new_player(pid: u8, name: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(2 + name.len());
    buf.push(server_opcode::NEW_PLAYER);
    buf.push(pid);
    buf.extend_from_slice(name.as_bytes());
    buf
}

/// Decoded init message (client side of `encode_init`, used in tests)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitData {
    pub pid: u8,
    pub map_width: u16,
    pub map_height: u16,
    pub view_width: u16,
    pub view_height: u16,
    pub particles: Vec<ParticleRecord>,
}

pub fn decode_init(buf: &[u8]) -> Result<InitData, ProtocolError> {
    if buf.len() < INIT_HEADER_SIZE || buf[0] != server_opcode::INIT {
        return Err(ProtocolError::BadPayload {
            opcode: server_opcode::INIT,
            len: buf.len(),
        });
    }
    let body = &buf[INIT_HEADER_SIZE..];
    if body.len() % PARTICLE_RECORD_SIZE != 0 {
        return Err(ProtocolError::BadRecordLength(body.len()));
    }
    Ok(InitData {
        pid: buf[1],
        map_width: u16::from_be_bytes([buf[2], buf[3]]),
        map_height: u16::from_be_bytes([buf[4], buf[5]]),
        view_width: u16::from_be_bytes([buf[6], buf[7]]),
        view_height: u16::from_be_bytes([buf[8], buf[9]]),
        particles: read_records(body),
    })
}

pub fn decode_update(buf: &[u8]) -> Result<Vec<ParticleRecord>, ProtocolError> {
    let (&opcode, body) = buf.split_first().ok_or(ProtocolError::Empty)?;
    if opcode != server_opcode::UPDATE {
        return Err(ProtocolError::UnknownOpcode(opcode));
    }
    if body.len() % PARTICLE_RECORD_SIZE != 0 {
        return Err(ProtocolError::BadRecordLength(body.len()));
    }
    Ok(read_records(body))
}

fn read_records(body: &[u8]) -> Vec<ParticleRecord> {
    (0..body.len() / PARTICLE_RECORD_SIZE)
        .map(|i| ParticleRecord::read_at(body, i * PARTICLE_RECORD_SIZE))
        .collect()
}

/// Per-client snapshot culling.
///
/// The camera center is the viewer's position clamped so the view rectangle
/// stays on the map; an entity is visible when its near edge falls inside
/// the view half-extents on both axes. The viewer's own entities are always
/// included so the client can track its player and hazard off-screen.
pub fn visible_entities<'a>(
    entities: &'a [Entity],
    viewer: &Entity,
    config: &WorldConfig,
) -> Vec<&'a Entity> {
    let half_w = config.view_width / 2.0;
    let half_h = config.view_height / 2.0;
    let center = Vec2::new(
        viewer.position.x.max(half_w).min(config.map_width - half_w),
        viewer.position.y.max(half_h).min(config.map_height - half_h),
    );

    entities
        .iter()
        .filter(|e| e.id == viewer.id || on_screen(e, center, half_w, half_h))
        .collect()
}

fn on_screen(e: &Entity, center: Vec2, half_w: f32, half_h: f32) -> bool {
    let edge_x = if e.position.x < center.x {
        e.position.x + e.radius
    } else {
        e.position.x - e.radius
    };
    let edge_y = if e.position.y < center.y {
        e.position.y + e.radius
    } else {
        e.position.y - e.radius
    };
    (center.x - edge_x).abs() < half_w && (center.y - edge_y).abs() < half_h
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entity::EntityKind;

    fn entity_at(x: f32, y: f32) -> Entity {
        Entity::particle(Vec2::new(x, y), Vec2::ZERO, 2)
    }

    #[test]
    fn test_record_round_trip() {
        let mut e = Entity::player(7, "p".to_string(), Vec2::new(123.9, 456.2), 4);
        e.radius = 20.7;

        let record = ParticleRecord::from_entity(&e);
        let mut buf = vec![0u8; PARTICLE_RECORD_SIZE];
        record.write_at(&mut buf, 0);
        let decoded = ParticleRecord::read_at(&buf, 0);

        assert_eq!(decoded, record);
        assert_eq!(decoded.id, 7);
        assert_eq!(decoded.kind, EntityKind::Player.code());
        assert_eq!(decoded.color, 4);
        // floats floored, at most one unit of loss
        assert_eq!(decoded.x, 123);
        assert_eq!(decoded.y, 456);
        assert_eq!(decoded.radius, 20);
    }

    #[test]
    fn test_record_is_big_endian() {
        let record = ParticleRecord {
            id: 1,
            kind: 0,
            color: 0,
            x: 0x0102,
            y: 0,
            radius: 0,
        };
        let mut buf = vec![0u8; PARTICLE_RECORD_SIZE];
        record.write_at(&mut buf, 0);
        assert_eq!(buf[3], 0x01);
        assert_eq!(buf[4], 0x02);
    }

    #[test]
    fn test_init_layout() {
        let config = WorldConfig::default();
        let entities = vec![entity_at(100.0, 200.0)];
        let buf = encode_init(9, &config, &entities);

        assert_eq!(buf.len(), 10 + 9);
        assert_eq!(buf[0], server_opcode::INIT);
        assert_eq!(buf[1], 9);
        assert_eq!(u16::from_be_bytes([buf[2], buf[3]]), 3000);
        assert_eq!(u16::from_be_bytes([buf[4], buf[5]]), 2200);
        assert_eq!(u16::from_be_bytes([buf[6], buf[7]]), 1920);
        assert_eq!(u16::from_be_bytes([buf[8], buf[9]]), 1080);
    }

    #[test]
    fn test_init_round_trip() {
        let config = WorldConfig::default();
        let entities = vec![entity_at(100.0, 200.0), entity_at(5.5, 7.5)];
        let decoded = decode_init(&encode_init(42, &config, &entities)).unwrap();

        assert_eq!(decoded.pid, 42);
        assert_eq!(decoded.map_width, 3000);
        assert_eq!(decoded.particles.len(), 2);
        assert_eq!(decoded.particles[1].x, 5);
        assert_eq!(decoded.particles[1].y, 7);
    }

    #[test]
    fn test_update_round_trip() {
        let entities = vec![entity_at(1.0, 2.0), entity_at(3.0, 4.0)];
        let refs: Vec<&Entity> = entities.iter().collect();
        let buf = encode_update(&refs);

        assert_eq!(buf[0], server_opcode::UPDATE);
        assert_eq!((buf.len() - 1) % PARTICLE_RECORD_SIZE, 0);

        let records = decode_update(&buf).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].x, 1);
        assert_eq!(records[1].y, 4);
    }

    #[test]
    fn test_update_rejects_ragged_length() {
        let mut buf = encode_update(&[]);
        buf.extend_from_slice(&[0u8; 5]);
        assert!(matches!(
            decode_update(&buf),
            Err(ProtocolError::BadRecordLength(5))
        ));
    }

    #[test]
    fn test_start_ack_is_single_byte() {
        assert_eq!(encode_start_ack(), vec![1]);
    }

    #[test]
    fn test_chat_layout() {
        let buf = encode_chat(12, "hi");
        assert_eq!(buf, vec![server_opcode::CHAT, 12, b'h', b'i']);
    }

    #[test]
    fn test_new_player_layout() {
        let buf = encode_new_player(3, "Alice");
        assert_eq!(buf[0], server_opcode::NEW_PLAYER);
        assert_eq!(buf[1], 3);
        assert_eq!(&buf[2..], b"Alice");
    }

    #[test]
    fn test_decode_start_command() {
        let mut buf = vec![client_opcode::START];
        buf.extend_from_slice("Alice".as_bytes());
        let cmd = decode_command(&buf, 16).unwrap();
        assert_eq!(
            cmd,
            ClientCommand::Start {
                name: "Alice".to_string()
            }
        );
    }

    #[test]
    fn test_decode_start_empty_name_defaults() {
        let cmd = decode_command(&[client_opcode::START], 16).unwrap();
        assert_eq!(
            cmd,
            ClientCommand::Start {
                name: "default".to_string()
            }
        );
    }

    #[test]
    fn test_name_truncated_to_sixteen_bytes() {
        let mut buf = vec![client_opcode::START];
        buf.extend_from_slice("abcdefghijklmnopqrstuvwxyz".as_bytes());
        match decode_command(&buf, 16).unwrap() {
            ClientCommand::Start { name } => assert_eq!(name, "abcdefghijklmnop"),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_name_truncation_respects_char_boundary() {
        // 5 x 3-byte chars = 15 bytes; the sixth would overflow the cap
        let mut buf = vec![client_opcode::START];
        buf.extend_from_slice("€€€€€€".as_bytes());
        match decode_command(&buf, 16).unwrap() {
            ClientCommand::Start { name } => {
                assert_eq!(name.chars().count(), 5);
                assert!(name.len() <= 16);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_decode_control_command() {
        let cmd = decode_command(&[client_opcode::CONTROL, 0b1010], 16).unwrap();
        match cmd {
            ClientCommand::Control(c) => {
                assert!(!c.up);
                assert!(c.down);
                assert!(!c.left);
                assert!(c.right);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_decode_control_wrong_length() {
        assert!(matches!(
            decode_command(&[client_opcode::CONTROL], 16),
            Err(ProtocolError::BadPayload { opcode: 1, .. })
        ));
        assert!(matches!(
            decode_command(&[client_opcode::CONTROL, 1, 2], 16),
            Err(ProtocolError::BadPayload { opcode: 1, .. })
        ));
    }

    #[test]
    fn test_decode_chat_command() {
        let mut buf = vec![client_opcode::CHAT];
        buf.extend_from_slice("hello there".as_bytes());
        assert_eq!(
            decode_command(&buf, 16).unwrap(),
            ClientCommand::Chat("hello there".to_string())
        );
    }

    #[test]
    fn test_decode_chat_invalid_utf8() {
        let buf = vec![client_opcode::CHAT, 0xFF, 0xFE];
        assert!(matches!(
            decode_command(&buf, 16),
            Err(ProtocolError::InvalidUtf8)
        ));
    }

    #[test]
    fn test_decode_unknown_opcode() {
        assert!(matches!(
            decode_command(&[9, 1, 2], 16),
            Err(ProtocolError::UnknownOpcode(9))
        ));
    }

    #[test]
    fn test_decode_empty_message() {
        assert!(matches!(decode_command(&[], 16), Err(ProtocolError::Empty)));
    }

    #[test]
    fn test_visibility_includes_nearby() {
        let config = WorldConfig::default();
        let viewer = Entity::player(1, "p".to_string(), Vec2::new(1500.0, 1100.0), 0);
        let entities = vec![viewer.clone(), entity_at(1600.0, 1150.0)];
        let visible = visible_entities(&entities, &viewer, &config);
        assert_eq!(visible.len(), 2);
    }

    #[test]
    fn test_visibility_excludes_far() {
        let config = WorldConfig::default();
        let viewer = Entity::player(1, "p".to_string(), Vec2::new(200.0, 200.0), 0);
        let entities = vec![viewer.clone(), entity_at(2900.0, 2100.0)];
        let visible = visible_entities(&entities, &viewer, &config);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, 1);
    }

    #[test]
    fn test_visibility_always_includes_own_hazard() {
        let config = WorldConfig::default();
        let viewer = Entity::player(1, "p".to_string(), Vec2::new(200.0, 200.0), 0);
        let own_hazard = Entity::hazard(1, "p".to_string(), Vec2::new(2900.0, 2100.0), 0);
        let entities = vec![viewer.clone(), own_hazard];
        let visible = visible_entities(&entities, &viewer, &config);
        assert_eq!(visible.len(), 2);
    }

    #[test]
    fn test_visibility_edge_overlap_counts() {
        let config = WorldConfig::default();
        // camera clamps to (960, 540) for a viewer in the top-left corner
        let viewer = Entity::player(1, "p".to_string(), Vec2::new(100.0, 100.0), 0);
        // center is outside the right view edge at 1920, near edge pokes in
        let near = entity_at(1930.0, 540.0);
        let entities = vec![viewer.clone(), near];
        let visible = visible_entities(&entities, &viewer, &config);
        assert_eq!(visible.len(), 2);
    }

    #[test]
    fn test_visibility_camera_clamped_at_corner() {
        let config = WorldConfig::default();
        let viewer = Entity::player(1, "p".to_string(), Vec2::new(0.0, 0.0), 0);
        // visible because the clamped camera still covers (0..1920, 0..1080)
        let corner_neighbor = entity_at(1900.0, 1000.0);
        // past the clamped view despite being "close" to the map corner math
        let beyond = entity_at(1940.0, 1000.0);
        let entities = vec![viewer.clone(), corner_neighbor, beyond];
        let visible = visible_entities(&entities, &viewer, &config);
        assert_eq!(visible.len(), 2);
    }
}
