// Envelope parsing for the capture-event types the server emits
// (camera motion/person/sound, doorbell chime) and listener forwarding.

use std::sync::{Arc, Mutex};

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;

use hearth_core::{CallbackError, Device, DeviceManager, EventMessage, TraitRegistry};

fn capture_event(event_type: &str) -> EventMessage {
    EventMessage::parse(json!({
        "eventId": "0120ecc7-3b57-4eb4-9941-91609f189fb4",
        "timestamp": "2019-01-01T00:00:01Z",
        "resourceUpdate": {
            "name": "enterprises/project-id/devices/device-id",
            "events": {
                event_type: {
                    "eventSessionId": "CjY5Y3VKaTZwR3o4Y19YbTVfMF...",
                    "eventId": "FWWVQVUdGNUlTU2V4MGV2aTNXV...",
                },
            },
        },
        "userId": "AVPHwEuBfnPOnTqzVFT4IONX2Qqhu9EJ4ubO-bNnQ-yi",
    }))
    .expect("valid envelope")
}

#[test]
fn capture_event_types_decode_uniformly() {
    for event_type in [
        "sdm.devices.events.CameraMotion.Motion",
        "sdm.devices.events.CameraPerson.Person",
        "sdm.devices.events.CameraSound.Sound",
        "sdm.devices.events.DoorbellChime.Chime",
    ] {
        let event = capture_event(event_type);

        assert_eq!(event.event_id(), "0120ecc7-3b57-4eb4-9941-91609f189fb4");
        assert_eq!(
            event.timestamp(),
            Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 1)
                .single()
                .expect("valid instant")
        );
        assert_eq!(
            event.resource_update_name(),
            Some("enterprises/project-id/devices/device-id")
        );

        let events = event.resource_update_events().expect("resource branch");
        let capture = events.get(event_type).expect("capture entry");
        assert_eq!(capture.event_id, "FWWVQVUdGNUlTU2V4MGV2aTNXV...");
        assert_eq!(capture.event_session_id, "CjY5Y3VKaTZwR3o4Y19YbTVfMF...");
        assert_eq!(capture.timestamp, event.timestamp());
        assert_eq!(
            capture.expires_at,
            Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 31)
                .single()
                .expect("valid instant")
        );
    }
}

#[test]
fn capture_events_are_forwarded_to_listeners_not_stored() {
    let mut mgr = DeviceManager::new();
    mgr.add_device(
        Device::from_descriptor(
            json!({
                "name": "enterprises/project-id/devices/device-id",
                "type": "sdm.devices.types.DOORBELL",
            }),
            &TraitRegistry::default(),
            None,
        )
        .expect("valid descriptor"),
    );

    let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    mgr.device_mut("enterprises/project-id/devices/device-id")
        .expect("registered")
        .add_event_callback(Arc::new(move |event: &EventMessage| {
            if let Some(events) = event.resource_update_events() {
                sink.lock()
                    .expect("not poisoned")
                    .extend(events.keys().cloned());
            }
            Ok::<(), CallbackError>(())
        }));

    mgr.handle_event(&capture_event("sdm.devices.events.DoorbellChime.Chime"));

    assert_eq!(
        *seen.lock().expect("not poisoned"),
        vec!["sdm.devices.events.DoorbellChime.Chime".to_owned()]
    );
    // The capture event was delivered, not persisted on the device.
    let device = mgr
        .device("enterprises/project-id/devices/device-id")
        .expect("registered");
    assert_eq!(device.traits().len(), 0);
}
