/// Wire format for the realtime gateway.
///
/// Both directions are closed tagged unions; anything a client sends that
/// does not parse into `ClientEvent` is answered with an `error` frame and
/// dropped.
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{MessageDto, Notification};

/// Inbound events, client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Subscribe this connection to the room for a peer conversation.
    #[serde(rename_all = "camelCase")]
    JoinChat { peer_id: Uuid },

    /// Send a direct message. Runs the same persistence path as the REST
    /// endpoint before anything is relayed.
    #[serde(rename_all = "camelCase")]
    SendMessage { receiver_id: Uuid, text: String },

    /// Typing indicator; relayed, never persisted.
    #[serde(rename_all = "camelCase")]
    Typing { receiver_id: Uuid, is_typing: bool },
}

/// Outbound events, server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerEvent {
    /// A message addressed to or visible to this connection's user.
    ReceiveMessage { message: MessageDto },

    /// A freshly recorded notification for this user.
    NewNotification { notification: Notification },

    /// A peer started or stopped typing.
    #[serde(rename_all = "camelCase")]
    UserTyping { user_id: Uuid, is_typing: bool },

    /// Handshake acknowledgement sent once per connection.
    #[serde(rename_all = "camelCase")]
    Connected { user_id: Uuid },

    /// Protocol-level failure on this connection.
    Error { message: String },
}

/// Order-independent room key for a user pair: sorted ids joined with `:`.
pub fn pair_room_key(a: Uuid, b: Uuid) -> String {
    let (lo, hi) = if a < b { (a, b) } else { (b, a) };
    format!("{}:{}", lo, hi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_event_tags_are_camel_case() {
        let evt: ClientEvent = serde_json::from_str(
            r#"{"type":"joinChat","peerId":"00000000-0000-0000-0000-000000000001"}"#,
        )
        .unwrap();
        assert!(matches!(evt, ClientEvent::JoinChat { .. }));

        let evt: ClientEvent = serde_json::from_str(
            r#"{"type":"sendMessage","receiverId":"00000000-0000-0000-0000-000000000002","text":"hey"}"#,
        )
        .unwrap();
        match evt {
            ClientEvent::SendMessage { receiver_id, text } => {
                assert_eq!(
                    receiver_id,
                    Uuid::parse_str("00000000-0000-0000-0000-000000000002").unwrap()
                );
                assert_eq!(text, "hey");
            }
            other => panic!("unexpected event: {:?}", other),
        }

        let evt: ClientEvent = serde_json::from_str(
            r#"{"type":"typing","receiverId":"00000000-0000-0000-0000-000000000002","isTyping":true}"#,
        )
        .unwrap();
        assert!(matches!(evt, ClientEvent::Typing { is_typing: true, .. }));
    }

    #[test]
    fn test_unknown_event_type_is_rejected() {
        let result = serde_json::from_str::<ClientEvent>(r#"{"type":"selfDestruct"}"#);
        assert!(result.is_err());

        let result = serde_json::from_str::<ClientEvent>("not even json");
        assert!(result.is_err());
    }

    #[test]
    fn test_server_event_wire_shape() {
        let evt = ServerEvent::UserTyping {
            user_id: Uuid::parse_str("00000000-0000-0000-0000-000000000003").unwrap(),
            is_typing: false,
        };
        let json = serde_json::to_value(&evt).unwrap();
        assert_eq!(json["type"], "userTyping");
        assert_eq!(json["userId"], "00000000-0000-0000-0000-000000000003");
        assert_eq!(json["isTyping"], false);

        let evt = ServerEvent::Error {
            message: "bad frame".to_string(),
        };
        let json = serde_json::to_value(&evt).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["message"], "bad frame");
    }

    #[test]
    fn test_pair_room_key_is_order_independent() {
        let a = Uuid::parse_str("00000000-0000-0000-0000-000000000001").unwrap();
        let b = Uuid::parse_str("00000000-0000-0000-0000-000000000002").unwrap();

        assert_eq!(pair_room_key(a, b), pair_room_key(b, a));
        assert_eq!(
            pair_room_key(a, b),
            "00000000-0000-0000-0000-000000000001:00000000-0000-0000-0000-000000000002"
        );
    }
}
