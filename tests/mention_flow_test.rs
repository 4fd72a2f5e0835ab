//! End-to-end tests of the dispatcher against a recording bot
//! Run with: cargo test --test mention_flow_test

use async_trait::async_trait;
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use tagall_bot::application::errors::{BotError, EnumerationError};
use tagall_bot::application::messaging::{ChatRouter, DispatcherOptions, EventDispatcher};
use tagall_bot::application::services::{BatchLimits, RosterStrategy};
use tagall_bot::domain::entities::{Chat, ChatEvent, ChatId, ChatKind, User};
use tagall_bot::domain::traits::{Bot, BotInfo, ParseMode};
use tagall_bot::infrastructure::storage::MemoryStore;

static INIT: Once = Once::new();

fn ensure_init() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Bot that records what it sends and answers membership queries from a script
struct RecordingBot {
    sent: Mutex<Vec<(ChatId, String, ParseMode)>>,
    members: Result<Vec<User>, EnumerationError>,
    delay: Option<Duration>,
    send_delay: Option<Duration>,
}

impl RecordingBot {
    fn new(members: Result<Vec<User>, EnumerationError>) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            members,
            delay: None,
            send_delay: None,
        }
    }

    fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn slow_sends(mut self, delay: Duration) -> Self {
        self.send_delay = Some(delay);
        self
    }

    fn sent(&self) -> Vec<(ChatId, String, ParseMode)> {
        self.sent.lock().unwrap().clone()
    }

    fn texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|(_, text, _)| text).collect()
    }
}

#[async_trait]
impl Bot for RecordingBot {
    async fn start(&self) -> Result<(), BotError> {
        Ok(())
    }

    async fn send_message(&self, chat_id: ChatId, text: &str, mode: ParseMode) -> Result<String, BotError> {
        if let Some(delay) = self.send_delay {
            tokio::time::sleep(delay).await;
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push((chat_id, text.to_string(), mode));
        Ok(sent.len().to_string())
    }

    async fn enumerate_members(&self, _chat_id: ChatId) -> Result<Vec<User>, EnumerationError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.members.clone()
    }

    fn bot_info(&self) -> BotInfo {
        BotInfo {
            id: 999,
            name: "tagall-bot".to_string(),
            username: "tagall_bot".to_string(),
        }
    }
}

const GROUP: ChatId = -100;

fn options(strategy: RosterStrategy) -> DispatcherOptions {
    DispatcherOptions {
        bot_name: "tagall-bot".to_string(),
        command_prefix: "/".to_string(),
        strategy,
        limits: BatchLimits::default(),
        enumeration_timeout: Duration::from_secs(5),
    }
}

fn setup(bot: RecordingBot, options: DispatcherOptions) -> (Arc<RecordingBot>, EventDispatcher<RecordingBot, MemoryStore>) {
    ensure_init();
    let bot = Arc::new(bot);
    let dispatcher = EventDispatcher::new(bot.clone(), Arc::new(MemoryStore::new()), options);
    (bot, dispatcher)
}

fn alice() -> User {
    User::new(1, "Alice").with_username("alice")
}

fn bob() -> User {
    User::new(2, "Bob").with_username("bob")
}

fn carol() -> User {
    User::new(3, "Carol")
}

fn say(user: &User, text: &str) -> ChatEvent {
    ChatEvent::message(Chat::group(GROUP), user.clone(), text)
}

const CAROL_LINK: &str = "<a href=\"tg://user?id=3\">Carol</a>";

#[tokio::test]
async fn test_passive_mention_all_excludes_caller() {
    let (bot, dispatcher) = setup(RecordingBot::new(Ok(vec![])), options(RosterStrategy::Passive));

    for user in [alice(), bob(), carol()] {
        dispatcher.dispatch(say(&user, "hello")).await.unwrap();
    }
    dispatcher.dispatch(say(&alice(), "/all")).await.unwrap();

    let sent = bot.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, GROUP);
    assert_eq!(sent[0].1, format!("@bob {}", CAROL_LINK));
    assert_eq!(sent[0].2, ParseMode::Html);
}

#[tokio::test]
async fn test_inline_marker_triggers_fanout() {
    let (bot, dispatcher) = setup(RecordingBot::new(Ok(vec![])), options(RosterStrategy::Passive));

    dispatcher.dispatch(say(&bob(), "hi")).await.unwrap();
    dispatcher.dispatch(say(&alice(), "meeting in 5 @all")).await.unwrap();

    assert_eq!(bot.texts(), vec!["@bob".to_string()]);
}

#[tokio::test]
async fn test_unknown_roster_sends_no_mentions() {
    let (bot, dispatcher) = setup(RecordingBot::new(Ok(vec![])), options(RosterStrategy::Passive));

    dispatcher.dispatch(say(&alice(), "/all")).await.unwrap();

    let texts = bot.texts();
    assert_eq!(texts.len(), 1);
    assert!(texts[0].contains("don't know the members"));

    // The first caller is now known to everyone else
    dispatcher.dispatch(say(&bob(), "/all")).await.unwrap();
    assert_eq!(bot.texts()[1], "@alice");
}

#[tokio::test]
async fn test_only_caller_known_reports_nobody_to_mention() {
    let (bot, dispatcher) = setup(RecordingBot::new(Ok(vec![])), options(RosterStrategy::Passive));

    dispatcher.dispatch(say(&alice(), "hi")).await.unwrap();
    dispatcher.dispatch(say(&alice(), "/all")).await.unwrap();

    let texts = bot.texts();
    assert_eq!(texts.len(), 1);
    assert!(texts[0].contains("Nobody to mention"));
}

#[tokio::test]
async fn test_roster_emptied_by_leaves_is_unknown() {
    let (bot, dispatcher) = setup(RecordingBot::new(Ok(vec![])), options(RosterStrategy::Passive));

    dispatcher
        .dispatch(ChatEvent::MembersJoined { chat: Chat::group(GROUP), users: vec![alice()] })
        .await
        .unwrap();
    dispatcher
        .dispatch(ChatEvent::MemberLeft { chat: Chat::group(GROUP), user: alice() })
        .await
        .unwrap();
    dispatcher.dispatch(say(&bob(), "/all")).await.unwrap();

    let texts = bot.texts();
    assert_eq!(texts.len(), 1);
    assert!(texts[0].contains("don't know the members"));
}

#[tokio::test]
async fn test_bot_senders_are_ignored() {
    let (bot, dispatcher) = setup(RecordingBot::new(Ok(vec![])), options(RosterStrategy::Passive));

    dispatcher.dispatch(say(&alice(), "hi")).await.unwrap();
    dispatcher
        .dispatch(say(&User::new(8, "Other").with_username("other_bot").bot(), "/all"))
        .await
        .unwrap();
    assert!(bot.sent().is_empty());

    // ...and never end up in the roster
    dispatcher.dispatch(say(&bob(), "/all")).await.unwrap();
    assert_eq!(bot.texts(), vec!["@alice".to_string()]);
}

#[tokio::test]
async fn test_large_roster_is_split() {
    let (bot, dispatcher) = setup(RecordingBot::new(Ok(vec![])), options(RosterStrategy::Passive));

    let users: Vec<User> = (100..221).map(|id| User::new(id, "m").with_username(format!("m{}", id))).collect();
    dispatcher
        .dispatch(ChatEvent::MembersJoined { chat: Chat::group(GROUP), users: users.clone() })
        .await
        .unwrap();
    dispatcher.dispatch(say(&users[0], "/all")).await.unwrap();

    let texts = bot.texts();
    let sizes: Vec<usize> = texts.iter().map(|t| t.split(' ').count()).collect();
    assert_eq!(sizes, vec![50, 50, 20]);

    let flat: Vec<String> = texts.iter().flat_map(|t| t.split(' ').map(str::to_string)).collect();
    let expected: Vec<String> = users[1..].iter().map(|u| format!("@{}", u.username.as_ref().unwrap())).collect();
    assert_eq!(flat, expected);
}

#[tokio::test]
async fn test_leave_removes_from_fanout() {
    let (bot, dispatcher) = setup(RecordingBot::new(Ok(vec![])), options(RosterStrategy::Passive));

    dispatcher
        .dispatch(ChatEvent::MembersJoined { chat: Chat::group(GROUP), users: vec![alice(), bob(), carol()] })
        .await
        .unwrap();
    dispatcher
        .dispatch(ChatEvent::MemberLeft { chat: Chat::group(GROUP), user: bob() })
        .await
        .unwrap();
    dispatcher.dispatch(say(&alice(), "/all")).await.unwrap();

    assert_eq!(bot.texts(), vec![CAROL_LINK.to_string()]);
}

#[tokio::test]
async fn test_active_strategy_sees_silent_members() {
    let members = vec![alice(), bob(), carol(), User::new(50, "Helper").with_username("helper_bot").bot()];
    let (bot, dispatcher) = setup(RecordingBot::new(Ok(members)), options(RosterStrategy::Active));

    // Nobody but the caller ever spoke
    dispatcher.dispatch(say(&alice(), "/all")).await.unwrap();

    assert_eq!(bot.texts(), vec![format!("@bob {}", CAROL_LINK)]);
}

#[tokio::test]
async fn test_active_enumeration_failure_is_reported() {
    let failure = Err(EnumerationError::Permission("not enough rights".to_string()));
    let (bot, dispatcher) = setup(RecordingBot::new(failure), options(RosterStrategy::Active));

    dispatcher.dispatch(say(&bob(), "hi")).await.unwrap();
    dispatcher.dispatch(say(&alice(), "/all")).await.unwrap();

    let texts = bot.texts();
    assert_eq!(texts.len(), 1);
    assert!(texts[0].contains("administrator"));
    assert!(!texts[0].contains("@bob"));
}

#[tokio::test]
async fn test_active_enumeration_timeout_sends_nothing_partial() {
    let mut opts = options(RosterStrategy::Active);
    opts.enumeration_timeout = Duration::from_millis(50);
    let bot = RecordingBot::new(Ok(vec![alice(), bob()])).slow(Duration::from_secs(5));
    let (bot, dispatcher) = setup(bot, opts);

    dispatcher.dispatch(say(&alice(), "/all")).await.unwrap();

    let texts = bot.texts();
    assert_eq!(texts.len(), 1);
    assert!(texts[0].contains("Couldn't get the member list"));
}

#[tokio::test]
async fn test_hybrid_falls_back_to_observed_roster() {
    let failure = Err(EnumerationError::Incomplete { listed: 2, total: 40 });
    let (bot, dispatcher) = setup(RecordingBot::new(failure), options(RosterStrategy::Hybrid));

    dispatcher.dispatch(say(&bob(), "hi")).await.unwrap();
    dispatcher.dispatch(say(&alice(), "/all")).await.unwrap();

    assert_eq!(bot.texts(), vec!["@bob".to_string()]);
}

#[tokio::test]
async fn test_hybrid_prefers_live_members() {
    let (bot, dispatcher) = setup(RecordingBot::new(Ok(vec![alice(), carol()])), options(RosterStrategy::Hybrid));

    // Bob was seen but is no longer a member
    dispatcher.dispatch(say(&bob(), "hi")).await.unwrap();
    dispatcher.dispatch(say(&alice(), "/all")).await.unwrap();

    assert_eq!(bot.texts(), vec![CAROL_LINK.to_string()]);
}

#[tokio::test]
async fn test_group_commands_rejected_in_private_chat() {
    let (bot, dispatcher) = setup(RecordingBot::new(Ok(vec![])), options(RosterStrategy::Passive));

    let private = Chat::new(1, ChatKind::Private);
    dispatcher.dispatch(ChatEvent::message(private, alice(), "/all")).await.unwrap();
    dispatcher.dispatch(ChatEvent::message(private, alice(), "/help")).await.unwrap();

    let texts = bot.texts();
    assert_eq!(texts.len(), 2);
    assert!(texts[0].contains("only works in groups"));
    assert!(texts[1].contains("/all"));
}

#[tokio::test]
async fn test_random_can_pick_the_caller() {
    let (bot, dispatcher) = setup(RecordingBot::new(Ok(vec![])), options(RosterStrategy::Passive));

    dispatcher.dispatch(say(&alice(), "hi")).await.unwrap();
    dispatcher.dispatch(say(&alice(), "/random")).await.unwrap();
    dispatcher.dispatch(say(&alice(), "/owner")).await.unwrap();

    let texts = bot.texts();
    assert_eq!(texts[0], "🎲 @alice is the new owner!");
    assert!(texts[1].starts_with("👑 Current owner: @alice"));
}

#[tokio::test]
async fn test_pick_claim_and_owner() {
    let (bot, dispatcher) = setup(RecordingBot::new(Ok(vec![])), options(RosterStrategy::Passive));

    dispatcher.dispatch(say(&alice(), "/owner")).await.unwrap();
    dispatcher.dispatch(say(&alice(), "/pick")).await.unwrap();
    dispatcher.dispatch(say(&alice(), "/pick dave")).await.unwrap();
    dispatcher.dispatch(say(&carol(), "/claim")).await.unwrap();
    dispatcher.dispatch(say(&bob(), "/owner")).await.unwrap();

    let texts = bot.texts();
    assert_eq!(texts.len(), 5);
    assert!(texts[0].contains("Nobody owns this chat yet"));
    assert!(texts[1].starts_with("Usage: /pick"));
    assert_eq!(texts[2], "🎯 @dave is the new owner!");
    assert_eq!(texts[3], format!("👑 {} claimed ownership!", CAROL_LINK));
    assert!(texts[4].contains(CAROL_LINK));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_chats_do_not_interfere() {
    ensure_init();
    let bot = Arc::new(RecordingBot::new(Ok(vec![])));
    let dispatcher = Arc::new(EventDispatcher::new(
        bot.clone(),
        Arc::new(MemoryStore::new()),
        options(RosterStrategy::Passive),
    ));

    let mut handles = Vec::new();
    for chat in [-1i64, -2, -3] {
        for id in 1..=30i64 {
            let dispatcher = dispatcher.clone();
            handles.push(tokio::spawn(async move {
                let user = User::new(id + chat * -1000, "u").with_username(format!("u{}_{}", -chat, id));
                dispatcher.dispatch(ChatEvent::message(Chat::group(chat), user, "hi")).await
            }));
        }
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let caller = User::new(9999, "Caller");
    dispatcher.dispatch(ChatEvent::message(Chat::group(-2), caller, "/all")).await.unwrap();

    let sent = bot.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, -2);
    assert_eq!(sent[0].1.split(' ').count(), 30);
    assert!(sent[0].1.split(' ').all(|m| m.starts_with("@u2_")));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_leave_queued_behind_slow_fanout_stays_applied() {
    let failure = Err(EnumerationError::Incomplete { listed: 1, total: 3 });
    let bot = RecordingBot::new(failure).slow_sends(Duration::from_millis(100));
    let (bot, dispatcher) = setup(bot, options(RosterStrategy::Hybrid));
    let router = ChatRouter::new(Arc::new(dispatcher));

    router.route(say(&alice(), "hi")).await;
    router.route(say(&bob(), "/all")).await;
    router.route(ChatEvent::MemberLeft { chat: Chat::group(GROUP), user: bob() }).await;
    router.route(say(&alice(), "/all")).await;
    router.shutdown().await;

    let texts = bot.texts();
    assert_eq!(texts.len(), 2);
    assert_eq!(texts[0], "@alice");
    assert!(texts.iter().all(|t| !t.contains("@bob")), "bob left but is still mentioned");
    assert!(texts[1].contains("Nobody to mention"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_tracking_does_not_wait_for_sends() {
    let failure = Err(EnumerationError::Incomplete { listed: 1, total: 3 });
    let bot = RecordingBot::new(failure).slow_sends(Duration::from_millis(200));
    let (bot, dispatcher) = setup(bot, options(RosterStrategy::Hybrid));
    let dispatcher = Arc::new(dispatcher);

    dispatcher.dispatch(say(&alice(), "hi")).await.unwrap();

    let fanout = {
        let dispatcher = dispatcher.clone();
        tokio::spawn(async move { dispatcher.dispatch(say(&bob(), "/all")).await })
    };
    // Bob's fanout is still sending when he leaves
    tokio::time::sleep(Duration::from_millis(50)).await;
    dispatcher
        .dispatch(ChatEvent::MemberLeft { chat: Chat::group(GROUP), user: bob() })
        .await
        .unwrap();
    fanout.await.unwrap().unwrap();

    dispatcher.dispatch(say(&alice(), "/all")).await.unwrap();

    let texts = bot.texts();
    assert_eq!(texts[0], "@alice");
    assert!(texts[1].contains("Nobody to mention"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_router_keeps_chats_apart() {
    let (bot, dispatcher) = setup(RecordingBot::new(Ok(vec![])), options(RosterStrategy::Passive));
    let router = ChatRouter::new(Arc::new(dispatcher));

    for chat in [-1i64, -2] {
        for user in [alice(), bob()] {
            router.route(ChatEvent::message(Chat::group(chat), user, "hi")).await;
        }
    }
    router.route(ChatEvent::MemberLeft { chat: Chat::group(-1), user: bob() }).await;
    router.route(ChatEvent::message(Chat::group(-1), alice(), "/all")).await;
    router.route(ChatEvent::message(Chat::group(-2), alice(), "/all")).await;
    router.shutdown().await;

    let mut sent: Vec<(ChatId, String)> = bot.sent().into_iter().map(|(chat, text, _)| (chat, text)).collect();
    sent.sort();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].0, -2);
    assert_eq!(sent[0].1, "@bob");
    assert_eq!(sent[1].0, -1);
    assert!(sent[1].1.contains("Nobody to mention"));
}
