#[cfg(test)]
mod tests {
    use skillbridge_core::*;

    fn inbound() -> Activity {
        let mut a = Activity::message("book a meeting");
        a.id = Some("act-1".into());
        a.channel_id = Some("msteams".into());
        a.service_url = Some("https://smba.example.com/".into());
        a.from = Some(ChannelAccount::new("user-1", Some("Ada".into())));
        a.recipient = Some(ChannelAccount::new("bot-1", Some("Assistant".into())));
        a.conversation = Some(ConversationAccount::new("conv-1"));
        a.locale = Some("en-us".into());
        a
    }

    // ── Activity tests ─────────────────────────────────────────

    #[test]
    fn test_skill_begin_copies_routing_fields() {
        let source = inbound();
        let begin = Activity::skill_begin(&source, None);
        assert_eq!(begin.activity_type, ActivityType::Event);
        assert_eq!(begin.name.as_deref(), Some(SKILL_BEGIN_EVENT));
        assert_eq!(begin.channel_id.as_deref(), Some("msteams"));
        assert_eq!(begin.from, source.from);
        assert_eq!(begin.recipient, source.recipient);
        assert_eq!(begin.conversation_id(), Some("conv-1"));
        assert!(begin.value.is_none());
        assert!(begin.text.is_none());
        assert!(begin.id.is_some());
        assert_ne!(begin.id, Activity::skill_begin(&source, None).id);
    }

    #[test]
    fn test_create_reply_swaps_parties() {
        let source = inbound();
        let reply = source.create_reply();
        assert_eq!(reply.from, source.recipient);
        assert_eq!(reply.recipient, source.from);
        assert_eq!(reply.reply_to_id.as_deref(), Some("act-1"));
        assert_eq!(reply.conversation, source.conversation);
        assert_eq!(reply.service_url, source.service_url);
        assert!(reply.timestamp.is_some());
    }

    #[test]
    fn test_token_response_is_clone_then_patch() {
        let source = inbound();
        let token = TokenResponse::new("graph", "secret-token");
        let event = source.to_token_response(&token).unwrap();

        assert_eq!(event.activity_type, ActivityType::Event);
        assert_eq!(event.name.as_deref(), Some(TOKEN_RESPONSE_EVENT));
        assert_eq!(event.value.as_ref().unwrap()["token"], "secret-token");
        assert_eq!(event.value.as_ref().unwrap()["connectionName"], "graph");
        assert_eq!(event.id, source.id);
        assert_eq!(event.conversation, source.conversation);

        // The source activity is not aliased.
        assert_eq!(source.activity_type, ActivityType::Message);
        assert!(source.name.is_none());
    }

    #[test]
    fn test_token_request_detected_by_name() {
        let event = Activity::event(TOKEN_REQUEST_EVENT, None);
        assert!(event.is_token_request());

        let mut message = Activity::message("hi");
        message.name = Some(TOKEN_REQUEST_EVENT.into());
        assert!(message.is_token_request());

        assert!(!Activity::message("hi").is_token_request());
    }

    #[test]
    fn test_deserialize_skill_batch() {
        let body = r#"[
            {"type": "message", "text": "hi", "attachments": [{"contentType": "card"}]},
            {"type": "trace", "text": "debug", "label": "x"},
            {"type": "endOfConversation", "code": "completedSuccessfully"}
        ]"#;
        let batch: Vec<Activity> = serde_json::from_str(body).unwrap();
        assert_eq!(batch.len(), 3);
        assert_eq!(batch[0].text.as_deref(), Some("hi"));
        assert!(batch[0].extra.contains_key("attachments"));
        assert!(batch[1].is_trace());
        assert!(batch[2].is_end_of_conversation());

        // Unmodelled fields survive a relay.
        let out = serde_json::to_value(&batch[0]).unwrap();
        assert_eq!(out["attachments"][0]["contentType"], "card");
    }

    #[test]
    fn test_wire_field_names_are_camel_case() {
        let json = serde_json::to_value(inbound()).unwrap();
        assert_eq!(json["type"], "message");
        assert_eq!(json["channelId"], "msteams");
        assert_eq!(json["serviceUrl"], "https://smba.example.com/");
        assert_eq!(json["conversation"]["id"], "conv-1");
        assert!(json.get("replyToId").is_none());
    }

    // ── Turn result tests ──────────────────────────────────────

    #[test]
    fn test_turn_result_constructors() {
        assert!(DialogTurnResult::waiting().is_waiting());
        let done = DialogTurnResult::complete(Some(serde_json::json!({"ok": true})));
        assert!(done.is_complete());
        assert_eq!(done.result.unwrap()["ok"], true);
        assert_eq!(
            serde_json::to_value(DialogTurnResult::waiting()).unwrap(),
            serde_json::json!({"status": "waiting"})
        );
    }

    // ── Manifest tests ─────────────────────────────────────────

    #[test]
    fn test_manifest_from_json() {
        let json = r#"{
            "id": "calendarSkill",
            "name": "Calendar Skill",
            "endpoint": "https://calendar.example.com/api/skill/messages",
            "msaAppId": "00000000-0000-0000-0000-000000000001",
            "authenticationConnections": [
                {"id": "Outlook", "serviceProviderId": "Azure AD v2", "scopes": "User.Read"}
            ],
            "actions": [
                {"id": "calendar_create", "definition": {
                    "slots": [{"name": "title", "types": ["string"]}, {"name": "when", "types": ["string"]}],
                    "triggers": {"utteranceSources": [{"locale": "en", "source": ["calendar#CreateCalendarEntry"]}]}
                }},
                {"id": "calendar_summary", "definition": {
                    "slots": [{"name": "when", "types": ["string"]}],
                    "triggers": {"events": [{"name": "summary"}]}
                }}
            ]
        }"#;
        let manifest: SkillManifest = serde_json::from_str(json).unwrap();
        assert_eq!(manifest.id, "calendarSkill");
        assert_eq!(manifest.endpoint.host_str(), Some("calendar.example.com"));
        assert!(manifest.requires_auth());
        assert_eq!(manifest.slot_names(), vec!["title", "when"]);
        assert!(manifest.matches("CALENDAR SKILL"));
        assert!(manifest.matches("calendarskill"));
        assert!(!manifest.matches("todo"));
    }

    #[test]
    fn test_manifest_from_toml() {
        let toml_str = r#"
id = "todo"
endpoint = "http://localhost:3980/api/skill/messages"
"#;
        let manifest: SkillManifest = toml::from_str(toml_str).unwrap();
        assert_eq!(manifest.id, "todo");
        assert!(!manifest.requires_auth());
        assert!(manifest.actions.is_empty());
    }

    // ── Error tests ────────────────────────────────────────────

    #[test]
    fn test_transport_error_displays_reason() {
        let err = BridgeError::Transport {
            status: 500,
            reason: "Internal Server Error".into(),
        };
        assert_eq!(err.to_string(), "Internal Server Error");
        assert_eq!(err.status(), Some(500));
        assert!(!err.is_cancelled());
    }

    #[test]
    fn test_cancelled_is_distinguishable() {
        assert!(BridgeError::Cancelled.is_cancelled());
        assert!(!BridgeError::Network("reset".into()).is_cancelled());
        assert!(BridgeError::Configuration("x".into()).status().is_none());
    }

    #[test]
    fn test_error_from_serde() {
        let bad: std::result::Result<Vec<Activity>, _> = serde_json::from_str("{not json");
        let err: BridgeError = bad.unwrap_err().into();
        assert!(matches!(err, BridgeError::Serialization(_)));
    }
}
