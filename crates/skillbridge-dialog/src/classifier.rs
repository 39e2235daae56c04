use skillbridge_core::Activity;

/// A skill response batch split by what the bridge must do with each part.
#[derive(Debug, Clone, Default)]
pub struct Classification {
    /// Activities to relay to the user, in their original order.
    pub deliver: Vec<Activity>,
    /// The skill signalled it is done.
    pub end_of_conversation: bool,
    /// The first token request in the batch, if any.
    pub token_request: Option<Activity>,
    /// Further token requests in the same batch. Only the first is served.
    pub dropped: usize,
}

/// Partition a response batch in one pass.
///
/// - `endOfConversation` sets the flag and is not relayed.
/// - The first `tokenRequest` (matched by name) is kept; later ones are
///   counted in `dropped`. Scanning continues past it.
/// - Everything else is relayed, trace activities included.
pub fn classify(batch: Vec<Activity>) -> Classification {
    let mut classification = Classification::default();

    for activity in batch {
        if activity.is_end_of_conversation() {
            classification.end_of_conversation = true;
        } else if activity.is_token_request() {
            if classification.token_request.is_some() {
                classification.dropped += 1;
            } else {
                classification.token_request = Some(activity);
            }
        } else {
            classification.deliver.push(activity);
        }
    }

    classification
}

#[cfg(test)]
mod tests {
    use super::*;
    use skillbridge_core::TOKEN_REQUEST_EVENT;

    #[test]
    fn test_order_preserved_and_eoc_removed() {
        let batch = vec![
            Activity::message("one"),
            Activity::trace("dbg"),
            Activity::end_of_conversation(),
            Activity::message("two"),
        ];
        let c = classify(batch);
        let texts: Vec<_> = c.deliver.iter().filter_map(|a| a.text.as_deref()).collect();
        assert_eq!(texts, vec!["one", "dbg", "two"]);
        assert!(c.end_of_conversation);
        assert!(c.token_request.is_none());
        assert_eq!(c.dropped, 0);
    }

    #[test]
    fn test_scan_continues_past_token_request() {
        let batch = vec![
            Activity::message("before"),
            Activity::event(TOKEN_REQUEST_EVENT, None),
            Activity::message("after"),
            Activity::end_of_conversation(),
        ];
        let c = classify(batch);
        let texts: Vec<_> = c.deliver.iter().filter_map(|a| a.text.as_deref()).collect();
        assert_eq!(texts, vec!["before", "after"]);
        assert!(c.token_request.is_some());
        assert!(c.end_of_conversation);
        assert_eq!(c.dropped, 0);
    }

    #[test]
    fn test_only_first_token_request_kept() {
        let mut first = Activity::event(TOKEN_REQUEST_EVENT, None);
        first.id = Some("first".into());
        let batch = vec![first, Activity::event(TOKEN_REQUEST_EVENT, None)];
        let c = classify(batch);
        assert_eq!(c.token_request.and_then(|a| a.id).as_deref(), Some("first"));
        assert_eq!(c.dropped, 1);
    }

    #[test]
    fn test_empty_batch() {
        let c = classify(vec![]);
        assert!(c.deliver.is_empty());
        assert!(!c.end_of_conversation);
        assert!(c.token_request.is_none());
    }
}
