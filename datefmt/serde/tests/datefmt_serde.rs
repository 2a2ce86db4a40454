use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc};
use serde::de::DeserializeSeed;
use serde::{Deserialize, Serialize};

use datefmt_serde::{
    Codec, FormatCodec, FormatValue, Marker, MetadataRegistry, PropertyMetadata, Resolver,
    TypeDescriptor, TypeMetadata, Value, ValueKind, create_codec,
};

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn hms(h: u32, m: u32, s: u32, ms: u32) -> NaiveTime {
    NaiveTime::from_hms_milli_opt(h, m, s, ms).unwrap()
}

fn write<T>(codec: &FormatCodec<T>, value: &T) -> String
where
    T: FormatValue,
{
    serde_json::to_string(&codec.formatted(value)).unwrap()
}

fn read<T>(codec: &FormatCodec<T>, json: &str) -> Result<T, serde_json::Error>
where
    T: FormatValue,
{
    codec.deserialize(&mut serde_json::Deserializer::from_str(json))
}

#[test]
fn date_time() {
    #[datefmt_serde::date_time]
    #[derive(Debug, Deserialize, PartialEq, Serialize)]
    struct Event {
        #[date_time(format = "yyyy-MM-dd")]
        day: NaiveDate,
        #[serde(rename = "begin")]
        #[date_time(format = "HH:mm:ss")]
        start: Option<NaiveTime>,
        #[date_time(format = "yyyy-MM-ddTHH:mm:sszzz")]
        created: DateTime<FixedOffset>,
        #[datefmt_serde::date_time(format = "dd/MM/yyyy HH:mm")]
        updated: Option<NaiveDateTime>,
        name: String,
    }

    let plus2 = FixedOffset::east_opt(2 * 3600).unwrap();
    let event = Event {
        day: ymd(2023, 10, 15),
        start: Some(hms(14, 30, 45, 0)),
        created: plus2.with_ymd_and_hms(2023, 10, 1, 8, 0, 0).unwrap(),
        updated: Some(ymd(2023, 10, 2).and_hms_opt(9, 15, 0).unwrap()),
        name: "launch".to_string(),
    };
    let json = concat!(
        r#"{"day":"2023-10-15","begin":"14:30:45","created":"2023-10-01T08:00:00+02:00","#,
        r#""updated":"02/10/2023 09:15","name":"launch"}"#,
    );
    assert_eq!(serde_json::to_string(&event).unwrap(), json);
    assert_eq!(serde_json::from_str::<Event>(json).unwrap(), event);

    let event = Event {
        start: None,
        updated: None,
        ..event
    };
    assert_eq!(
        serde_json::to_string(&event).unwrap(),
        concat!(
            r#"{"day":"2023-10-15","begin":null,"created":"2023-10-01T08:00:00+02:00","#,
            r#""updated":null,"name":"launch"}"#,
        ),
    );
    // Missing, null, and mismatched optional fields all read as `None`.
    assert_eq!(
        serde_json::from_str::<Event>(
            r#"{"day":"2023-10-15","created":"2023-10-01T08:00:00+02:00","name":"launch"}"#,
        )
        .unwrap(),
        event,
    );
    assert_eq!(
        serde_json::from_str::<Event>(concat!(
            r#"{"day":"2023-10-15","begin":"2:30 PM","created":"2023-10-01T08:00:00+02:00","#,
            r#""updated":[1,2],"name":"launch"}"#,
        ))
        .unwrap(),
        event,
    );
    // Required fields fall back to ISO 8601.
    assert_eq!(
        serde_json::from_str::<Event>(concat!(
            r#"{"day":"2023-10-15T23:00:00Z","created":"2023-10-01T06:00:00Z","#,
            r#""name":"launch"}"#,
        ))
        .unwrap(),
        Event {
            created: Utc.fix().with_ymd_and_hms(2023, 10, 1, 6, 0, 0).unwrap(),
            ..event
        },
    );
    assert!(
        serde_json::from_str::<Event>(
            r#"{"day":"15.10.2023","created":"2023-10-01T08:00:00+02:00","name":"launch"}"#,
        )
        .is_err(),
    );
    assert!(
        serde_json::from_str::<Event>(
            r#"{"day":null,"created":"2023-10-01T08:00:00+02:00","name":"launch"}"#,
        )
        .is_err(),
    );
}

#[test]
fn date_time_enum() {
    #[datefmt_serde::date_time]
    #[derive(Debug, Deserialize, PartialEq, Serialize)]
    enum Deadline {
        On(#[date_time(format = "yyyyMMdd")] NaiveDate),
        At {
            #[date_time(format = "HH:mm")]
            time: NaiveTime,
        },
    }

    for (value, json) in [
        (Deadline::On(ymd(2024, 2, 29)), r#"{"On":"20240229"}"#),
        (
            Deadline::At {
                time: hms(7, 5, 0, 0),
            },
            r#"{"At":{"time":"07:05"}}"#,
        ),
    ] {
        assert_eq!(serde_json::to_string(&value).unwrap(), json);
        assert_eq!(serde_json::from_str::<Deadline>(json).unwrap(), value);
    }
}

#[test]
fn round_trip() {
    let codec = FormatCodec::<NaiveDateTime>::new("yyyy-MM-ddTHH:mm:ss.fff").unwrap();
    let value = ymd(2023, 10, 15).and_time(hms(14, 30, 45, 123));
    assert_eq!(read(&codec, &write(&codec, &value)).unwrap(), value);

    let codec = FormatCodec::<Option<DateTime<FixedOffset>>>::new("dd MMM yyyy HH:mm zzz").unwrap();
    let value = Some(
        FixedOffset::west_opt(5 * 3600)
            .unwrap()
            .with_ymd_and_hms(2023, 10, 15, 14, 30, 0)
            .unwrap(),
    );
    assert_eq!(write(&codec, &value), "\"15 Oct 2023 14:30 -05:00\"");
    assert_eq!(read(&codec, &write(&codec, &value)).unwrap(), value);

    let codec = FormatCodec::<NaiveDate>::new("dddd, MMMM d, yyyy").unwrap();
    let value = ymd(2023, 10, 15);
    assert_eq!(write(&codec, &value), "\"Sunday, October 15, 2023\"");
    assert_eq!(read(&codec, &write(&codec, &value)).unwrap(), value);

    let codec = FormatCodec::<NaiveTime>::new("hh:mm:ss tt").unwrap();
    let value = hms(23, 59, 58, 0);
    assert_eq!(write(&codec, &value), "\"11:59:58 PM\"");
    assert_eq!(read(&codec, &write(&codec, &value)).unwrap(), value);
}

#[test]
fn lossy_pattern() {
    let codec = FormatCodec::<NaiveDateTime>::new("yyyy-MM-dd").unwrap();
    let value = ymd(2023, 10, 15).and_time(hms(14, 30, 45, 0));
    assert_eq!(write(&codec, &value), "\"2023-10-15\"");
    assert_eq!(
        read(&codec, &write(&codec, &value)).unwrap(),
        ymd(2023, 10, 15).and_hms_opt(0, 0, 0).unwrap(),
    );

    let codec = FormatCodec::<Option<NaiveTime>>::new("HH:mm:ss").unwrap();
    assert_eq!(write(&codec, &Some(hms(14, 30, 45, 123))), "\"14:30:45\"");
    assert_eq!(write(&codec, &None), "null");
}

#[test]
fn fallback_divergence() {
    let json = "\"2023-10-15T14:30:45Z\"";

    let required = FormatCodec::<NaiveDateTime>::new("dd-MM-yyyy").unwrap();
    assert_eq!(
        read(&required, json).unwrap(),
        ymd(2023, 10, 15).and_time(hms(14, 30, 45, 0)),
    );
    let optional = FormatCodec::<Option<NaiveDateTime>>::new("dd-MM-yyyy").unwrap();
    assert_eq!(read(&optional, json).unwrap(), None);

    // Projection of the same instant.
    assert_eq!(
        read(&FormatCodec::<NaiveDate>::new("dd-MM-yyyy").unwrap(), json).unwrap(),
        ymd(2023, 10, 15),
    );
    assert_eq!(
        read(&FormatCodec::<NaiveTime>::new("HH-mm").unwrap(), json).unwrap(),
        hms(14, 30, 45, 0),
    );
    assert_eq!(
        read(
            &FormatCodec::<DateTime<FixedOffset>>::new("dd-MM-yyyy").unwrap(),
            json,
        )
        .unwrap(),
        Utc.fix().with_ymd_and_hms(2023, 10, 15, 14, 30, 45).unwrap(),
    );

    let required = FormatCodec::<NaiveDate>::new("dd-MM-yyyy").unwrap();
    assert!(read(&required, "\"garbage\"").is_err());
    let optional = FormatCodec::<Option<NaiveDate>>::new("dd-MM-yyyy").unwrap();
    assert_eq!(read(&optional, "\"garbage\"").unwrap(), None);
}

#[test]
fn exact_match() {
    let optional = FormatCodec::<Option<NaiveDate>>::new("yyyy-MM-dd").unwrap();
    for json in [
        "\"223-10-15\"",
        "\"2023-1-5\"",
        "\" 2023-10-15\"",
        "\"2023- 10-15\"",
        "\"2023-10-15 \"",
    ] {
        assert_eq!(read(&optional, json).unwrap(), None, "{json}");
    }
    assert_eq!(read(&optional, "\"2023-10-15\"").unwrap(), Some(ymd(2023, 10, 15)));

    let optional = FormatCodec::<Option<NaiveTime>>::new("HH:mm:ss").unwrap();
    assert_eq!(read(&optional, "\"1:2:3\"").unwrap(), None);
    let optional = FormatCodec::<Option<NaiveTime>>::new("H:m:s").unwrap();
    assert_eq!(read(&optional, "\"1:2:3\"").unwrap(), Some(hms(1, 2, 3, 0)));

    let optional = FormatCodec::<Option<NaiveDate>>::new("dd/MM/yy").unwrap();
    assert_eq!(read(&optional, "\"15/10/55\"").unwrap(), Some(ymd(1955, 10, 15)));
    assert_eq!(read(&optional, "\"15/10/25\"").unwrap(), Some(ymd(2025, 10, 15)));

    let codec = FormatCodec::<NaiveDateTime>::new("yyyy-MM-ddTHH:mm:ss.fffffffK").unwrap();
    let value = ymd(2023, 10, 15).and_time(NaiveTime::from_hms_nano_opt(14, 30, 45, 120_000_000).unwrap());
    assert_eq!(write(&codec, &value), "\"2023-10-15T14:30:45.1200000\"");
    assert_eq!(read(&codec, &write(&codec, &value)).unwrap(), value);
}

#[test]
fn null() {
    for kind in ValueKind::ALL.into_iter().filter(|kind| kind.is_optional()) {
        let codec = Codec::new(kind, "yyyy-MM-dd").unwrap();
        assert_eq!(
            codec
                .read_value(&mut serde_json::Deserializer::from_str("null"))
                .unwrap(),
            None,
        );
        let mut output = Vec::new();
        codec
            .write_value(None, &mut serde_json::Serializer::new(&mut output))
            .unwrap();
        assert_eq!(output, b"null");
    }
    for kind in ValueKind::ALL.into_iter().filter(|kind| !kind.is_optional()) {
        let codec = Codec::new(kind, "yyyy-MM-dd").unwrap();
        assert!(
            codec
                .read_value(&mut serde_json::Deserializer::from_str("null"))
                .is_err(),
        );
    }
}

#[test]
fn dispatch() {
    let pairs = [
        (TypeDescriptor::of::<NaiveDateTime>(), ValueKind::RequiredInstant),
        (TypeDescriptor::of::<Option<NaiveDateTime>>(), ValueKind::OptionalInstant),
        (TypeDescriptor::of::<DateTime<FixedOffset>>(), ValueKind::RequiredOffsetInstant),
        (
            TypeDescriptor::of::<Option<DateTime<FixedOffset>>>(),
            ValueKind::OptionalOffsetInstant,
        ),
        (TypeDescriptor::of::<NaiveDate>(), ValueKind::RequiredDate),
        (TypeDescriptor::of::<Option<NaiveDate>>(), ValueKind::OptionalDate),
        (TypeDescriptor::of::<NaiveTime>(), ValueKind::RequiredTime),
        (TypeDescriptor::of::<Option<NaiveTime>>(), ValueKind::OptionalTime),
    ];
    for (type_, kind) in pairs {
        let codec = create_codec(Some(&type_), "yyyy-MM-ddTHH:mm:ss").unwrap();
        assert_eq!(codec.kind(), kind);
        assert_eq!(codec.kind().type_descriptor(), type_);
    }

    let codec = create_codec(Some(&TypeDescriptor::of::<Option<NaiveDate>>()), "dd/MM/yyyy").unwrap();
    let value = codec
        .read_value(&mut serde_json::Deserializer::from_str("\"15/10/2023\""))
        .unwrap();
    assert_eq!(value, Some(Value::Date(ymd(2023, 10, 15))));
    assert!(codec.typed::<Option<NaiveDate>>().is_some());

    let error = create_codec(Some(&TypeDescriptor::of::<String>()), "yyyy").unwrap_err();
    assert_eq!(
        error.to_string(),
        format!(
            "{} is not supported by the datefmt_serde::dispatch::create_codec",
            std::any::type_name::<String>(),
        ),
    );
    assert!(create_codec(None, "yyyy").is_err());
}

#[test]
fn resolver() {
    struct Booking;

    let mut registry = MetadataRegistry::new();
    registry.insert(
        TypeMetadata::of::<Booking>()
            .with_property(
                PropertyMetadata::of::<Option<NaiveDate>, _>("check_in")
                    .with_marker(Marker::Format("dd.MM.yyyy".to_string())),
            )
            .with_property(PropertyMetadata::of::<String, _>("guest")),
    );
    let resolver = Resolver::new(|type_id| registry.get(type_id));

    let metadata = resolver.resolve_type::<Booking>().unwrap().unwrap();
    let codec = metadata.property("check_in").unwrap().codec().unwrap();
    assert_eq!(codec.kind(), ValueKind::OptionalDate);
    let mut output = Vec::new();
    codec
        .write_value(
            Some(&Value::Date(ymd(2023, 10, 15))),
            &mut serde_json::Serializer::new(&mut output),
        )
        .unwrap();
    assert_eq!(output, b"\"15.10.2023\"");
    assert_eq!(metadata.property("guest").unwrap().codec(), None);

    assert_eq!(Resolver::empty().resolve_type::<Booking>(), Ok(None));
}
