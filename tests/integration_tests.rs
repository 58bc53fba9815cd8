//! 存储集成测试

use aset_chat_db::*;
use rusqlite::params;
use tempfile::TempDir;

/// 创建临时存储
fn setup_store() -> (ChatStore, TempDir) {
    let tmp = TempDir::new().unwrap();
    let db_path = tmp.path().join("test.db");
    let config = DbConfig::local(&db_path);
    let store = ChatStore::connect(config).unwrap();
    (store, tmp)
}

/// 构造一条用户消息
fn user_message(content: &str) -> ChatMessage {
    ChatMessage::user(content)
}

// ==================== 连接测试 ====================

mod connection_tests {
    use super::*;

    #[test]
    fn test_connect_creates_db_file() {
        let tmp = TempDir::new().unwrap();
        let db_path = tmp.path().join("subdir").join("test.db");

        // 目录不存在
        assert!(!db_path.parent().unwrap().exists());

        let config = DbConfig::local(&db_path);
        let _store = ChatStore::connect(config).unwrap();

        // 连接后文件应该存在
        assert!(db_path.exists());
    }

    #[test]
    fn test_reconnect_preserves_data() {
        let (store, tmp) = setup_store();
        store.create("hello", vec![user_message("hello")]).unwrap();
        drop(store);

        // 重新连接同一个存储
        let db_path = tmp.path().join("test.db");
        let store2 = ChatStore::connect(DbConfig::local(&db_path)).unwrap();

        let chats = store2.list();
        assert_eq!(chats.len(), 1);
        assert_eq!(chats[0].name, "hello");
    }

    #[test]
    fn test_empty_store_lists_nothing() {
        let (store, _tmp) = setup_store();
        assert!(store.list().is_empty());
    }
}

// ==================== 创建测试 ====================

mod create_tests {
    use super::*;

    #[test]
    fn test_create_then_get_round_trip() {
        let (store, _tmp) = setup_store();

        let message = user_message("hello");
        let id = store.create("hello", vec![message.clone()]).unwrap();

        let chat = store.get(id).unwrap();
        assert_eq!(chat.id, id);
        assert_eq!(chat.name, "hello");
        assert_eq!(chat.messages, vec![message]);
        assert_eq!(chat.message_count, 1);
        assert_eq!(chat.created_at, chat.last_updated);
    }

    #[test]
    fn test_create_truncates_long_name() {
        let (store, _tmp) = setup_store();

        // 60 字符消息 → 53 字符名称，以 "..." 结尾
        let message = "c".repeat(60);
        let id = store.create(&message, vec![user_message(&message)]).unwrap();

        let chat = store.get(id).unwrap();
        assert_eq!(chat.name.chars().count(), 53);
        assert!(chat.name.ends_with("..."));
        assert!(chat.name.starts_with(&"c".repeat(50)));
    }

    #[test]
    fn test_create_ids_are_increasing() {
        let (store, _tmp) = setup_store();

        // 同一毫秒内连续创建也必须得到递增的 ID
        let id1 = store.create("first", vec![user_message("first")]).unwrap();
        let id2 = store.create("second", vec![user_message("second")]).unwrap();
        let id3 = store.create("third", vec![user_message("third")]).unwrap();

        assert!(id2 > id1);
        assert!(id3 > id2);
        assert_eq!(store.list().len(), 3);
    }

    #[test]
    fn test_create_with_metadata_round_trip() {
        let (store, _tmp) = setup_store();

        let paper = Paper {
            title: "Observation of Hawking radiation analogues".into(),
            authors: "J. Steinhauer".into(),
            year: Some(2016),
            journal: Some("Nature Physics".into()),
            source: PaperSource::NasaAds,
            relevance: 8.7,
            abstract_text: None,
            url: Some("https://example.org/paper".into()),
            paper_id: Some("2016.1234".into()),
        };
        let meta = SearchMeta {
            domain: "astrophysics".into(),
            topic: "black holes".into(),
            subtopic: "hawking radiation".into(),
            total_sources: 1,
            query_time: 42,
        };
        let messages = vec![
            user_message("Can black holes evaporate?"),
            ChatMessage::assistant("Found 1 relevant papers")
                .with_sources(vec![paper.clone()], meta),
        ];

        let id = store.create("Can black holes evaporate?", messages).unwrap();

        let chat = store.get(id).unwrap();
        assert_eq!(chat.message_count, 2);
        let stored = chat.messages[1].metadata.as_ref().unwrap();
        assert_eq!(stored.papers, vec![paper]);
        assert_eq!(stored.search_metadata.total_sources, 1);
        assert!(stored.verification.is_none());
    }
}

// ==================== 列表排序测试 ====================

mod list_tests {
    use super::*;

    #[test]
    fn test_list_sorted_by_last_updated_desc() {
        let (store, _tmp) = setup_store();

        let id_a = store.create("chat a", vec![user_message("a")]).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let id_b = store.create("chat b", vec![user_message("b")]).unwrap();

        // 最近创建的在前
        let chats = store.list();
        assert_eq!(chats[0].id, id_b);
        assert_eq!(chats[1].id, id_a);

        // 更新 A 后，A 移到最前
        store.rename(id_a, "chat a renamed").unwrap();
        let chats = store.list();
        assert_eq!(chats[0].id, id_a);
        assert_eq!(chats[1].id, id_b);
    }

    #[test]
    fn test_search_filters_by_name() {
        let (store, _tmp) = setup_store();

        store
            .create("Can black holes evaporate?", vec![user_message("x")])
            .unwrap();
        store
            .create("Neutron star masses", vec![user_message("y")])
            .unwrap();

        // 大小写不敏感的子串匹配
        let hits = store.search("BLACK");
        assert_eq!(hits.len(), 1);
        assert!(hits[0].name.contains("black"));

        // 空查询等同 list
        assert_eq!(store.search("   ").len(), 2);

        // 无匹配
        assert!(store.search("exoplanet").is_empty());
    }
}

// ==================== 更新测试 ====================

mod update_tests {
    use super::*;

    #[test]
    fn test_update_bumps_last_updated_strictly() {
        let (store, _tmp) = setup_store();

        let id = store.create("hello", vec![user_message("hello")]).unwrap();
        let before = store.get(id).unwrap();

        let updated = store
            .update(
                id,
                ChatUpdate {
                    name: Some("X".into()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.name, "X");
        assert!(updated.last_updated > before.last_updated);
        assert_eq!(updated.created_at, before.created_at);
    }

    #[test]
    fn test_update_messages_refreshes_count() {
        let (store, _tmp) = setup_store();

        let id = store.create("hello", vec![user_message("hello")]).unwrap();

        let messages = vec![
            user_message("hello"),
            ChatMessage::assistant("Found 3 relevant papers"),
            user_message("tell me more"),
        ];
        let updated = store
            .update(
                id,
                ChatUpdate {
                    messages: Some(messages.clone()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.message_count, 3);
        assert_eq!(updated.messages, messages);
        // 未指定 name 时保持不变
        assert_eq!(updated.name, "hello");
    }

    #[test]
    fn test_update_missing_id_is_side_effect_free() {
        let (store, _tmp) = setup_store();

        let id = store.create("hello", vec![user_message("hello")]).unwrap();
        let before = store.list();

        let result = store.update(
            id + 999,
            ChatUpdate {
                name: Some("X".into()),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(Error::ChatNotFound(_))));

        // 集合不变
        assert_eq!(store.list(), before);
    }

    #[test]
    fn test_rename_delegates_to_update() {
        let (store, _tmp) = setup_store();

        let id = store.create("hello", vec![user_message("hello")]).unwrap();
        let renamed = store.rename(id, "My chat").unwrap();

        assert_eq!(renamed.name, "My chat");
        assert_eq!(store.get(id).unwrap().name, "My chat");
    }
}

// ==================== 删除测试 ====================

mod delete_tests {
    use super::*;

    #[test]
    fn test_delete_is_final() {
        let (store, _tmp) = setup_store();

        let id = store.create("hello", vec![user_message("hello")]).unwrap();

        assert!(store.delete(id).unwrap());
        assert!(store.get(id).is_none());
        assert!(store.list().is_empty());
    }

    #[test]
    fn test_delete_unknown_id_returns_false() {
        let (store, _tmp) = setup_store();

        let id = store.create("hello", vec![user_message("hello")]).unwrap();
        let before = store.list();

        assert!(!store.delete(id + 999).unwrap());
        // 集合不变
        assert_eq!(store.list(), before);
    }

    #[test]
    fn test_delete_all_leaves_empty_history() {
        let (store, _tmp) = setup_store();

        let id1 = store.create("one", vec![user_message("one")]).unwrap();
        let id2 = store.create("two", vec![user_message("two")]).unwrap();

        assert!(store.delete(id1).unwrap());
        assert!(store.delete(id2).unwrap());
        assert!(store.list().is_empty());
    }
}

// ==================== 损坏数据测试 ====================

mod corruption_tests {
    use super::*;

    /// 向 KV 槽位写入任意内容（模拟损坏/外部篡改）
    fn poison_slot(store: &ChatStore, value: &str) {
        let conn = store.connection().lock();
        conn.execute(
            r#"
            INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, 0)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
            params![schema::CHAT_HISTORY_KEY, value],
        )
        .unwrap();
    }

    #[test]
    fn test_corrupt_blob_treated_as_empty() {
        let (store, _tmp) = setup_store();
        store.create("hello", vec![user_message("hello")]).unwrap();

        poison_slot(&store, "{not valid json");

        // 损坏按"无数据"处理，不报错
        assert!(store.list().is_empty());
        assert!(store.get(1).is_none());
    }

    #[test]
    fn test_create_after_corruption_starts_fresh() {
        let (store, _tmp) = setup_store();
        poison_slot(&store, "[1, 2, \"garbage\"]");

        let id = store
            .create("fresh start", vec![user_message("fresh start")])
            .unwrap();

        let chats = store.list();
        assert_eq!(chats.len(), 1);
        assert_eq!(chats[0].id, id);
    }
}
