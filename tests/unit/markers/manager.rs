use std::cell::RefCell;
use std::rc::Rc;

use super::*;
use crate::foundation::core::{Pose, Vec3};
use crate::foundation::error::OverlayError;
use crate::markers::message::MarkerElement;
use crate::tf::tracker::NullTransformProvider;
use crate::updates::update_channel;

#[derive(Default, Clone)]
struct Calls {
    log: Rc<RefCell<Vec<String>>>,
    reject: Option<&'static str>,
}

impl MarkerChannelProvider for Calls {
    fn subscribe(&mut self, spec: &ChannelSpec, _sink: UpdateSink) -> OverlayResult<()> {
        if self.reject == Some(spec.name.as_str()) {
            return Err(OverlayError::source("no such topic"));
        }
        self.log
            .borrow_mut()
            .push(format!("sub {} @{}", spec.name, spec.throttle_rate_ms));
        Ok(())
    }

    fn unsubscribe(&mut self, channel: &str) {
        self.log.borrow_mut().push(format!("unsub {channel}"));
    }
}

fn setup(calls: Calls) -> (MarkerStreamManager, TransformFrameTracker) {
    let (sink, _queue) = update_channel();
    let tracker = TransformFrameTracker::new(Box::new(NullTransformProvider), sink.clone());
    (MarkerStreamManager::new(Box::new(calls), sink), tracker)
}

fn payload(frame: &str, label: &str) -> MarkerPayload {
    MarkerPayload::single(frame, vec![MarkerElement::labelled(Vec3::ZERO, label)])
}

fn first_label(m: &MarkerMessage) -> &str {
    m.payload
        .elements()
        .next()
        .and_then(|e| e.visible_label())
        .unwrap_or_default()
}

#[test]
fn subscribe_uses_default_throttle() {
    let calls = Calls::default();
    let log = calls.log.clone();
    let (mut mgr, _tf) = setup(calls);
    mgr.subscribe(ChannelSpec::new("/im/update"), MarkerKind::InteractiveMarkerInit)
        .unwrap();
    assert!(mgr.is_subscribed("/im/update"));
    assert_eq!(*log.borrow(), vec!["sub /im/update @3800".to_string()]);
}

#[test]
fn provider_rejection_is_not_recorded() {
    let (mut mgr, _tf) = setup(Calls {
        reject: Some("/bad"),
        ..Calls::default()
    });
    assert!(
        mgr.subscribe(ChannelSpec::new("/bad"), MarkerKind::InteractiveMarkerInit)
            .is_err()
    );
    assert!(!mgr.is_subscribed("/bad"));
}

#[test]
fn replace_not_append_per_kind() {
    let (mut mgr, mut tf) = setup(Calls::default());
    mgr.subscribe(ChannelSpec::new("/a"), MarkerKind::from("K1"))
        .unwrap();

    assert_eq!(
        mgr.handle_payload("/a", payload("base", "one"), &mut tf),
        PayloadOutcome::Inserted
    );
    for label in ["two", "three"] {
        assert_eq!(
            mgr.handle_payload("/a", payload("base", label), &mut tf),
            PayloadOutcome::Replaced
        );
    }

    assert_eq!(mgr.active().len(), 1);
    let k1 = mgr.active().get(&MarkerKind::from("K1")).unwrap();
    assert_eq!(first_label(k1), "three");
}

#[test]
fn two_channels_of_same_kind_share_one_slot() {
    let (mut mgr, mut tf) = setup(Calls::default());
    mgr.subscribe(ChannelSpec::new("/a"), MarkerKind::from("K1"))
        .unwrap();
    mgr.subscribe(ChannelSpec::new("/b"), MarkerKind::from("K1"))
        .unwrap();
    mgr.handle_payload("/a", payload("base", "from a"), &mut tf);
    mgr.handle_payload("/b", payload("base", "from b"), &mut tf);
    assert_eq!(mgr.active().len(), 1);
    assert_eq!(mgr.active().iter().next().unwrap().channel, "/b");
}

#[test]
fn payload_registers_unknown_frame() {
    let (mut mgr, mut tf) = setup(Calls::default());
    mgr.subscribe(ChannelSpec::new("/a"), MarkerKind::InteractiveMarkerInit)
        .unwrap();
    assert!(!tf.is_tracked("gripper"));
    mgr.handle_payload("/a", payload("gripper", "x"), &mut tf);
    assert!(tf.is_tracked("gripper"));
    assert_eq!(tf.lookup("gripper"), Pose::IDENTITY);

    mgr.handle_payload("/a", payload("gripper", "y"), &mut tf);
    assert_eq!(tf.len(), 1);
}

#[test]
fn empty_payload_mutates_nothing() {
    let (mut mgr, mut tf) = setup(Calls::default());
    mgr.subscribe(ChannelSpec::new("/a"), MarkerKind::InteractiveMarkerInit)
        .unwrap();
    mgr.handle_payload("/a", payload("base", "keep"), &mut tf);
    let frames_before = tf.len();

    assert_eq!(
        mgr.handle_payload("/a", MarkerPayload::default(), &mut tf),
        PayloadOutcome::Dropped(DropReason::Empty)
    );
    assert_eq!(tf.len(), frames_before);
    assert_eq!(mgr.active().len(), 1);
    assert_eq!(first_label(mgr.active().iter().next().unwrap()), "keep");
}

#[test]
fn payload_without_frame_is_dropped() {
    let (mut mgr, mut tf) = setup(Calls::default());
    mgr.subscribe(ChannelSpec::new("/a"), MarkerKind::InteractiveMarkerInit)
        .unwrap();
    let mut p = payload("base", "x");
    p.groups[0].frame_id = None;
    assert_eq!(
        mgr.handle_payload("/a", p, &mut tf),
        PayloadOutcome::Dropped(DropReason::MissingFrame)
    );
    assert!(mgr.active().is_empty());
    assert!(tf.is_empty());
}

#[test]
fn unsubscribe_keeps_last_known_markers() {
    let calls = Calls::default();
    let log = calls.log.clone();
    let (mut mgr, mut tf) = setup(calls);
    mgr.subscribe(ChannelSpec::new("/a"), MarkerKind::InteractiveMarkerInit)
        .unwrap();
    mgr.handle_payload("/a", payload("base", "stale"), &mut tf);

    assert!(mgr.unsubscribe("/a"));
    assert!(!mgr.unsubscribe("/a"));
    assert_eq!(log.borrow().last().map(String::as_str), Some("unsub /a"));
    assert_eq!(mgr.active().len(), 1);

    // queued deliveries after unsubscribing no longer mutate the set
    assert_eq!(
        mgr.handle_payload("/a", payload("base", "late"), &mut tf),
        PayloadOutcome::Dropped(DropReason::UnknownChannel)
    );
    assert_eq!(first_label(mgr.active().iter().next().unwrap()), "stale");

    assert_eq!(mgr.purge_channel("/a"), 1);
    assert!(mgr.active().is_empty());
}

#[test]
fn resubscribe_replaces_subscription() {
    let calls = Calls::default();
    let log = calls.log.clone();
    let (mut mgr, _tf) = setup(calls);
    mgr.subscribe(ChannelSpec::new("/a"), MarkerKind::from("K1"))
        .unwrap();
    mgr.subscribe(
        ChannelSpec {
            name: "/a".to_string(),
            throttle_rate_ms: 100,
        },
        MarkerKind::from("K2"),
    )
    .unwrap();
    assert_eq!(mgr.subscriptions().count(), 1);
    let (spec, kind) = mgr.subscriptions().next().unwrap();
    assert_eq!(spec.throttle_rate_ms, 100);
    assert_eq!(kind, &MarkerKind::from("K2"));
    assert_eq!(
        *log.borrow(),
        vec![
            "sub /a @3800".to_string(),
            "unsub /a".to_string(),
            "sub /a @100".to_string()
        ]
    );
}
