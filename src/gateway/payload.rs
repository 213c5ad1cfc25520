use crate::errors::{RelayError, RelayResult};
use crate::message::{ChannelKind, InboundMessage, MediaRef};
use serde::Deserialize;
use tracing::debug;

/// Decode a raw webhook body into canonical messages. The decoder is chosen
/// by the provider the route belongs to — payload shapes are never sniffed.
pub fn parse(channel: ChannelKind, raw: &[u8]) -> RelayResult<Vec<InboundMessage>> {
    match channel {
        ChannelKind::Twilio => parse_twilio_form(raw),
        ChannelKind::WhatsApp => parse_whatsapp_batch(raw),
        ChannelKind::Messenger => parse_messenger_batch(raw),
    }
}

/// Twilio delivers one message per webhook as a form-encoded body:
/// `From` (required), `Body` (text messages), `MediaUrl0` (voice notes).
fn parse_twilio_form(raw: &[u8]) -> RelayResult<Vec<InboundMessage>> {
    let mut from = None;
    let mut body = None;
    let mut media_url = None;
    for (key, value) in form_urlencoded::parse(raw) {
        match key.as_ref() {
            "From" => from = Some(value.into_owned()),
            "Body" => body = Some(value.into_owned()),
            "MediaUrl0" => media_url = Some(value.into_owned()),
            _ => {}
        }
    }

    let from = from.ok_or_else(|| RelayError::Parse("twilio form missing From".into()))?;
    if from.is_empty() {
        return Err(RelayError::Parse("twilio form has empty From".into()));
    }

    let message = if let Some(url) = media_url {
        InboundMessage::audio(ChannelKind::Twilio, from, MediaRef::Url(url))
    } else {
        let text = body.filter(|b| !b.is_empty()).ok_or_else(|| {
            RelayError::Parse("twilio form has neither Body nor MediaUrl0".into())
        })?;
        InboundMessage::text(ChannelKind::Twilio, from, text)
    };
    Ok(vec![message])
}

// WhatsApp Cloud API batch shape: entry[] -> changes[] -> value.messages[].

#[derive(Debug, Deserialize)]
struct WhatsAppPayload {
    entry: Vec<WhatsAppEntry>,
}

#[derive(Debug, Deserialize)]
struct WhatsAppEntry {
    #[serde(default)]
    changes: Vec<WhatsAppChange>,
}

#[derive(Debug, Deserialize)]
struct WhatsAppChange {
    value: WhatsAppValue,
}

#[derive(Debug, Deserialize)]
struct WhatsAppValue {
    #[serde(default)]
    messages: Vec<WhatsAppMessage>,
}

#[derive(Debug, Deserialize)]
struct WhatsAppMessage {
    from: String,
    #[serde(rename = "type")]
    kind: String,
    text: Option<WhatsAppText>,
    audio: Option<WhatsAppAudio>,
}

#[derive(Debug, Deserialize)]
struct WhatsAppText {
    body: String,
}

#[derive(Debug, Deserialize)]
struct WhatsAppAudio {
    id: String,
}

/// Every message of every change of every entry is extracted — a batch of
/// N entries with M messages each yields N*M canonical messages.
fn parse_whatsapp_batch(raw: &[u8]) -> RelayResult<Vec<InboundMessage>> {
    let payload: WhatsAppPayload = serde_json::from_slice(raw)
        .map_err(|e| RelayError::Parse(format!("whatsapp payload: {e}")))?;

    let mut messages = Vec::new();
    for entry in payload.entry {
        for change in entry.changes {
            for msg in change.value.messages {
                match msg.kind.as_str() {
                    "text" => {
                        let text = msg.text.ok_or_else(|| {
                            RelayError::Parse("whatsapp text message missing text.body".into())
                        })?;
                        messages.push(InboundMessage::text(
                            ChannelKind::WhatsApp,
                            msg.from,
                            text.body,
                        ));
                    }
                    "audio" => {
                        let audio = msg.audio.ok_or_else(|| {
                            RelayError::Parse("whatsapp audio message missing audio.id".into())
                        })?;
                        messages.push(InboundMessage::audio(
                            ChannelKind::WhatsApp,
                            msg.from,
                            MediaRef::MediaId(audio.id),
                        ));
                    }
                    other => {
                        debug!("skipping unsupported whatsapp message type: {}", other);
                    }
                }
            }
        }
    }
    Ok(messages)
}

// Messenger batch shape: entry[] -> messaging[].

#[derive(Debug, Deserialize)]
struct MessengerPayload {
    entry: Vec<MessengerEntry>,
}

#[derive(Debug, Deserialize)]
struct MessengerEntry {
    #[serde(default)]
    messaging: Vec<MessengerEvent>,
}

#[derive(Debug, Deserialize)]
struct MessengerEvent {
    sender: MessengerSender,
    message: Option<MessengerMessage>,
}

#[derive(Debug, Deserialize)]
struct MessengerSender {
    id: String,
}

#[derive(Debug, Deserialize)]
struct MessengerMessage {
    text: Option<String>,
    #[serde(default)]
    attachments: Vec<MessengerAttachment>,
}

#[derive(Debug, Deserialize)]
struct MessengerAttachment {
    #[serde(rename = "type")]
    kind: String,
    payload: MessengerAttachmentPayload,
}

#[derive(Debug, Deserialize)]
struct MessengerAttachmentPayload {
    url: Option<String>,
}

fn parse_messenger_batch(raw: &[u8]) -> RelayResult<Vec<InboundMessage>> {
    let payload: MessengerPayload = serde_json::from_slice(raw)
        .map_err(|e| RelayError::Parse(format!("messenger payload: {e}")))?;

    let mut messages = Vec::new();
    for entry in payload.entry {
        for event in entry.messaging {
            // Delivery receipts, read events and postbacks carry no message.
            let Some(message) = event.message else {
                debug!("skipping messenger event without message");
                continue;
            };

            let audio_url = message
                .attachments
                .iter()
                .find(|a| a.kind == "audio")
                .and_then(|a| a.payload.url.clone());

            if let Some(url) = audio_url {
                messages.push(InboundMessage::audio(
                    ChannelKind::Messenger,
                    event.sender.id,
                    MediaRef::Url(url),
                ));
            } else if let Some(text) = message.text.filter(|t| !t.is_empty()) {
                messages.push(InboundMessage::text(
                    ChannelKind::Messenger,
                    event.sender.id,
                    text,
                ));
            } else {
                debug!("skipping messenger message without text or audio");
            }
        }
    }
    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageBody;

    #[test]
    fn twilio_text_form_yields_one_message() {
        let raw = b"From=whatsapp%3A%2B15550001111&Body=hello+there";
        let messages = parse(ChannelKind::Twilio, raw).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].sender, "whatsapp:+15550001111");
        assert_eq!(messages[0].body, MessageBody::Text("hello there".into()));
    }

    #[test]
    fn twilio_media_form_yields_audio_message() {
        let raw = b"From=%2B15550001111&MediaUrl0=https%3A%2F%2Fapi.twilio.com%2Fmedia%2FME1";
        let messages = parse(ChannelKind::Twilio, raw).unwrap();
        assert_eq!(
            messages[0].body,
            MessageBody::Audio(MediaRef::Url("https://api.twilio.com/media/ME1".into()))
        );
    }

    #[test]
    fn twilio_missing_from_is_parse_error() {
        let err = parse(ChannelKind::Twilio, b"Body=hi").unwrap_err();
        assert!(matches!(err, RelayError::Parse(_)));
    }

    #[test]
    fn twilio_empty_body_without_media_is_parse_error() {
        let err = parse(ChannelKind::Twilio, b"From=%2B1555&Body=").unwrap_err();
        assert!(matches!(err, RelayError::Parse(_)));
    }

    fn whatsapp_text(from: &str, body: &str) -> serde_json::Value {
        serde_json::json!({
            "from": from,
            "id": "wamid.x",
            "type": "text",
            "text": {"body": body}
        })
    }

    #[test]
    fn whatsapp_single_text_message() {
        let raw = serde_json::json!({
            "object": "whatsapp_business_account",
            "entry": [{
                "id": "0",
                "changes": [{
                    "field": "messages",
                    "value": {"messages": [whatsapp_text("15550001111", "hola")]}
                }]
            }]
        });
        let messages = parse(ChannelKind::WhatsApp, raw.to_string().as_bytes()).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].sender, "15550001111");
        assert_eq!(messages[0].body, MessageBody::Text("hola".into()));
    }

    #[test]
    fn whatsapp_batch_extracts_every_message() {
        // 2 entries x 2 messages each = 4 canonical messages
        let raw = serde_json::json!({
            "entry": [
                {"changes": [{"value": {"messages": [
                    whatsapp_text("1", "a"),
                    whatsapp_text("2", "b")
                ]}}]},
                {"changes": [{"value": {"messages": [
                    whatsapp_text("3", "c"),
                    whatsapp_text("4", "d")
                ]}}]}
            ]
        });
        let messages = parse(ChannelKind::WhatsApp, raw.to_string().as_bytes()).unwrap();
        assert_eq!(messages.len(), 4);
        let bodies: Vec<_> = messages
            .iter()
            .map(|m| match &m.body {
                MessageBody::Text(t) => t.as_str(),
                MessageBody::Audio(_) => "audio",
            })
            .collect();
        assert_eq!(bodies, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn whatsapp_audio_message_carries_media_id() {
        let raw = serde_json::json!({
            "entry": [{"changes": [{"value": {"messages": [{
                "from": "15550001111",
                "type": "audio",
                "audio": {"id": "media-777", "mime_type": "audio/ogg"}
            }]}}]}]
        });
        let messages = parse(ChannelKind::WhatsApp, raw.to_string().as_bytes()).unwrap();
        assert_eq!(
            messages[0].body,
            MessageBody::Audio(MediaRef::MediaId("media-777".into()))
        );
    }

    #[test]
    fn whatsapp_unsupported_types_are_skipped_not_errors() {
        let raw = serde_json::json!({
            "entry": [{"changes": [{"value": {"messages": [
                {"from": "1", "type": "sticker"},
                whatsapp_text("2", "kept")
            ]}}]}]
        });
        let messages = parse(ChannelKind::WhatsApp, raw.to_string().as_bytes()).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].sender, "2");
    }

    #[test]
    fn whatsapp_text_without_body_is_parse_error() {
        let raw = serde_json::json!({
            "entry": [{"changes": [{"value": {"messages": [
                {"from": "1", "type": "text"}
            ]}}]}]
        });
        let err = parse(ChannelKind::WhatsApp, raw.to_string().as_bytes()).unwrap_err();
        assert!(matches!(err, RelayError::Parse(_)));
    }

    #[test]
    fn whatsapp_malformed_json_is_parse_error() {
        let err = parse(ChannelKind::WhatsApp, b"{\"entry\": 42}").unwrap_err();
        assert!(matches!(err, RelayError::Parse(_)));
    }

    #[test]
    fn messenger_batch_extracts_every_event() {
        let raw = serde_json::json!({
            "object": "page",
            "entry": [
                {"messaging": [
                    {"sender": {"id": "psid-1"}, "message": {"text": "first"}},
                    {"sender": {"id": "psid-2"}, "message": {"text": "second"}}
                ]},
                {"messaging": [
                    {"sender": {"id": "psid-3"}, "message": {"text": "third"}}
                ]}
            ]
        });
        let messages = parse(ChannelKind::Messenger, raw.to_string().as_bytes()).unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2].sender, "psid-3");
    }

    #[test]
    fn messenger_audio_attachment_wins_over_text() {
        let raw = serde_json::json!({
            "entry": [{"messaging": [{
                "sender": {"id": "psid-1"},
                "message": {
                    "attachments": [{"type": "audio", "payload": {"url": "https://cdn.fb/a.mp4"}}]
                }
            }]}]
        });
        let messages = parse(ChannelKind::Messenger, raw.to_string().as_bytes()).unwrap();
        assert_eq!(
            messages[0].body,
            MessageBody::Audio(MediaRef::Url("https://cdn.fb/a.mp4".into()))
        );
    }

    #[test]
    fn messenger_delivery_events_are_skipped() {
        let raw = serde_json::json!({
            "entry": [{"messaging": [
                {"sender": {"id": "psid-1"}, "delivery": {"watermark": 1}},
                {"sender": {"id": "psid-2"}, "message": {"text": "kept"}}
            ]}]
        });
        let messages = parse(ChannelKind::Messenger, raw.to_string().as_bytes()).unwrap();
        assert_eq!(messages.len(), 1);
    }
}
