//! End-to-end tests for the optimistic-concurrency update pipeline,
//! asserting against the audit trail as well as the aggregates.

use common::{ConversationId, InteractionStub, Version};
use domain::{ConversationService, HistoryService, InteractionService, NewInteraction};
use storage::{InMemoryConversationStore, InMemoryHistoryStore, InMemoryInteractionStore};

struct Fixture {
    interactions: InteractionService<
        InMemoryInteractionStore,
        InMemoryConversationStore,
        InMemoryHistoryStore,
    >,
    conversations: ConversationService<InMemoryConversationStore>,
    history: HistoryService<InMemoryHistoryStore>,
    history_store: InMemoryHistoryStore,
    conversation_id: ConversationId,
}

async fn fixture() -> Fixture {
    let conv_store = InMemoryConversationStore::new();
    let history_store = InMemoryHistoryStore::new();

    let conversations = ConversationService::new(conv_store.clone());
    let conversation = conversations
        .create(
            "wf-1".to_string(),
            "s-1".to_string(),
            "u-1".to_string(),
            vec![],
        )
        .await
        .unwrap();

    let interactions = InteractionService::new(
        InMemoryInteractionStore::new(),
        ConversationService::new(conv_store.clone()),
        HistoryService::new(history_store.clone()),
    );

    Fixture {
        interactions,
        conversations,
        history: HistoryService::new(history_store.clone()),
        history_store,
        conversation_id: conversation.id,
    }
}

#[tokio::test]
async fn create_update_conflict_scenario() {
    let f = fixture().await;

    // Create: version 1, stub visible on the conversation.
    let created = f
        .interactions
        .create(NewInteraction {
            workflow_id: "wf-1".to_string(),
            session_id: "s-1".to_string(),
            conversation_id: f.conversation_id,
            query: "What is X?".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(created.version, Version::first());

    let conversation = f.conversations.get(f.conversation_id).await.unwrap();
    assert_eq!(
        conversation.interactions,
        vec![InteractionStub {
            id: created.id,
            query: "What is X?".to_string(),
            answer: String::new(),
        }]
    );
    assert_eq!(f.history_store.record_count().await, 0);

    // Accepted update: version 2 plus exactly one audit record of the
    // pre-update state at the pre-increment version.
    let updated = f
        .interactions
        .update_answer(
            created.id,
            "X is Y".to_string(),
            "agent-1",
            "update",
            Version::first(),
        )
        .await
        .unwrap();
    assert_eq!(updated.version, Version::new(2));
    assert_eq!(updated.answer, "X is Y");

    let trail = f.history.list_for_interaction(created.id).await.unwrap();
    assert_eq!(trail.len(), 1);
    assert_eq!(trail[0].query, "What is X?");
    assert_eq!(trail[0].answer, "");
    assert_eq!(trail[0].version, Version::first());
    assert_eq!(trail[0].actor, "agent-1");

    // Stale second update: conflict, no mutation, no second audit record.
    let conflict = f
        .interactions
        .update_answer(
            created.id,
            "X is Z".to_string(),
            "agent-2",
            "update",
            Version::first(),
        )
        .await;
    assert!(conflict.unwrap_err().is_version_conflict());

    let stored = f.interactions.get(created.id).await.unwrap();
    assert_eq!(stored.answer, "X is Y");
    assert_eq!(stored.version, Version::new(2));
    assert_eq!(f.history_store.record_count().await, 1);
}

#[tokio::test]
async fn version_monotonicity_across_successive_updates() {
    let f = fixture().await;
    let created = f
        .interactions
        .create(NewInteraction {
            workflow_id: "wf-1".to_string(),
            session_id: "s-1".to_string(),
            conversation_id: f.conversation_id,
            query: "q".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    let mut version = created.version;
    for (i, value) in ["a", "b", "c"].iter().enumerate() {
        let updated = f
            .interactions
            .update_answer(created.id, value.to_string(), "agent", "update", version)
            .await
            .unwrap();
        assert_eq!(updated.version, version.next());
        version = updated.version;
        assert_eq!(f.history_store.record_count().await, i + 1);
    }

    // Each audit record carries the pre-increment version; replaying records
    // with version <= n reconstructs the state at version n.
    let trail = f.history.list_for_interaction(created.id).await.unwrap();
    let versions: Vec<i64> = trail.iter().map(|r| r.version.as_i64()).collect();
    assert_eq!(versions, vec![1, 2, 3]);
    assert_eq!(trail[1].answer, "a");
    assert_eq!(trail[2].answer, "b");
}

#[tokio::test]
async fn answer_merge_flows_back_to_conversation_stub() {
    let f = fixture().await;
    let created = f
        .interactions
        .create(NewInteraction {
            workflow_id: "wf-1".to_string(),
            session_id: "s-1".to_string(),
            conversation_id: f.conversation_id,
            query: "What is X?".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    f.conversations
        .add_interaction(
            f.conversation_id,
            InteractionStub {
                id: created.id,
                query: String::new(),
                answer: "X is Y".to_string(),
            },
        )
        .await
        .unwrap();

    let conversation = f.conversations.get(f.conversation_id).await.unwrap();
    assert_eq!(conversation.interactions.len(), 1);
    assert_eq!(conversation.interactions[0].answer, "X is Y");
    assert_eq!(conversation.interactions[0].query, "What is X?");
}
