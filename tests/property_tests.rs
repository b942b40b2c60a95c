//! Property-based tests для каналов.
//!
//! Генерируют случайные последовательности публикаций и операций с
//! подписками и проверяют порядок и учёт подписок.

use proptest::prelude::*;
use subpub::{Channel, Subscription};

const PROPTEST_CASES: u32 = 256;

/// Операция над каналом.
#[derive(Debug, Clone)]
enum Op {
    Publish(u16),
    Subscribe,
    CancelOldest,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => any::<u16>().prop_map(Op::Publish),
        2 => Just(Op::Subscribe),
        1 => Just(Op::CancelOldest),
    ]
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(PROPTEST_CASES))]

    /// Каждая очередь видит ровно те сообщения, что были опубликованы пока
    /// она была зарегистрирована, в порядке публикации.
    #[test]
    fn queue_receives_in_publish_order(
        before in prop::collection::vec(any::<u16>(), 0..20),
        during in prop::collection::vec(any::<u16>(), 0..200),
    ) {
        let channel: Channel<u16> = Channel::new("prop");
        for m in &before {
            channel.publish(*m);
        }

        let mut first = channel.get_subscription().unwrap();
        let mut second = channel.get_subscription().unwrap();
        for m in &during {
            prop_assert_eq!(channel.publish(*m), 2);
        }

        for sub in [&mut first, &mut second] {
            let mut got = Vec::new();
            while let Some(m) = sub.try_get().unwrap() {
                got.push(m);
            }
            prop_assert_eq!(&got, &during);
        }
    }

    /// Количество подписок всегда равно числу созданных минус отменённые, а
    /// каждая очередь получает ровно сообщения из своего окна жизни.
    #[test]
    fn registry_tracks_live_subscriptions(ops in prop::collection::vec(op_strategy(), 0..120)) {
        let rt = runtime();
        let channel: Channel<u16> = Channel::new("prop").with_runtime(rt.handle().clone());

        let mut live = Vec::new();
        let mut expected: Vec<Vec<u16>> = Vec::new();
        let mut callbacks = Vec::new();

        for op in ops {
            match op {
                Op::Publish(m) => {
                    let delivered = channel.publish(m);
                    prop_assert_eq!(delivered, live.len() + callbacks.len());
                    for e in expected.iter_mut() {
                        e.push(m);
                    }
                }
                Op::Subscribe => {
                    live.push(channel.get_subscription().unwrap());
                    expected.push(Vec::new());
                    callbacks.push(channel.subscribe(|_m: u16| {}).unwrap());
                }
                Op::CancelOldest => {
                    if !live.is_empty() {
                        let mut sub = live.remove(0);
                        let want = expected.remove(0);
                        let mut got = Vec::new();
                        while let Some(m) = sub.try_get().unwrap() {
                            got.push(m);
                        }
                        prop_assert_eq!(got, want);
                        sub.cancel();
                        prop_assert!(sub.try_get().is_err());
                        callbacks.remove(0).cancel();
                    }
                }
            }
            prop_assert_eq!(channel.subscription_count(), live.len() + callbacks.len());
        }
    }
}
