use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::json;
use stream_guide_lib::reconciler::{decode_segments, reconcile_within};
use stream_guide_lib::records::{decode_records, RawScheduleSegment};
use stream_guide_lib::{reconcile_live_segments, ErrorKind, LiveSegment};

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 18, 0, 0).unwrap()
}

fn seg(owner: &str, start_min: i64, end_min: i64) -> LiveSegment {
    LiveSegment::new(
        owner,
        base() + Duration::minutes(start_min),
        base() + Duration::minutes(end_min),
    )
}

#[test]
fn test_many_broadcasters_never_overlap() {
    let mut input = Vec::new();
    for b in 0..6 {
        for k in 0..5 {
            let start = (b * 13 + k * 47) % 300;
            input.push(seg(&format!("b{}", b), start, start + 30 + b * 7));
        }
    }
    input.push(seg("dup", 0, 30));
    input.push(seg("dup", 0, 30));

    let out = reconcile_live_segments(input).unwrap();

    assert!(out.windows(2).all(|p| p[0].till <= p[1].since));
    assert!(out.windows(2).all(|p| p[0].since <= p[1].since));
    assert!(out.iter().all(|s| s.since < s.till));
    for (i, a) in out.iter().enumerate() {
        for b in &out[i + 1..] {
            assert!(!a.same_interval(b));
        }
    }
}

#[test]
fn test_idempotent_on_reconciled_output() {
    let out = reconcile_live_segments(vec![seg("a", 0, 60), seg("b", 30, 90), seg("c", 45, 50)]).unwrap();
    let again = reconcile_live_segments(out.clone()).unwrap();
    assert_eq!(out, again);
}

#[test]
fn test_upstream_payload_to_timeline() {
    let payload = json!([
        {
            "id": "s2",
            "start_time": "2025-03-01T20:00:00Z",
            "end_time": "2025-03-01T22:00:00Z",
            "title": "Late show",
            "category": {"id": "26936", "name": "Music"},
            "is_recurring": false,
            "vacation": null
        },
        {
            "id": "s1",
            "start_time": "2025-03-01T19:00:00Z",
            "end_time": "2025-03-01T21:00:00Z",
            "title": "Early show",
            "category": null,
            "is_recurring": true
        }
    ]);
    let raw: Vec<RawScheduleSegment> = decode_records(&payload, "schedule").unwrap();
    let segments = decode_segments("42", raw).unwrap();
    let out = reconcile_live_segments(segments).unwrap();

    assert_eq!(out.len(), 2);
    assert_eq!(out[0].id.as_deref(), Some("s1"));
    assert_eq!(out[1].since, Utc.with_ymd_and_hms(2025, 3, 1, 21, 0, 0).unwrap());
    assert_eq!(out[1].channel_uuid.as_deref(), Some("26936"));

    let json = serde_json::to_value(&out[1]).unwrap();
    assert_eq!(json["broadcaster_id"], "42");
    assert_eq!(json["channelUuid"], "26936");
    assert_eq!(json["since"], "2025-03-01T21:00:00Z");
}

#[test]
fn test_bad_timestamp_is_invalid_input() {
    let payload = json!([{"start_time": "not a time", "end_time": "2025-03-01T22:00:00Z"}]);
    let raw: Vec<RawScheduleSegment> = decode_records(&payload, "schedule").unwrap();
    let err = decode_segments("42", raw).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[test]
fn test_window_filter() {
    let out = reconcile_within(
        vec![seg("a", -30, 30), seg("b", 0, 60), seg("c", 50, 120), seg("d", 100, 200)],
        base(),
        base() + Duration::minutes(180),
    )
    .unwrap();
    let owners: Vec<&str> = out.iter().map(|s| s.broadcaster_id.as_str()).collect();
    assert_eq!(owners, vec!["b", "c"]);
    assert_eq!(out[1].since, base() + Duration::minutes(60));
}
