use serde::Deserialize;

/// `S3Event` represents the raw notification batch sent by S3
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct S3Event {
    /// Notification records, one per created object
    #[serde(rename = "Records", default)]
    pub records: Vec<S3EventRecord>,
}

/// `S3EventRecord` describes one object creation
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct S3EventRecord {
    /// Service that emitted the event, `aws:s3` for S3 notifications
    #[serde(default)]
    pub event_source: String,
    /// Time the event was emitted, as sent by S3
    #[serde(default)]
    pub event_time: String,
    /// Bucket and object the event refers to
    pub s3: S3Entity,
}

/// `S3Entity` holds the bucket and object of a notification
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct S3Entity {
    /// Bucket holding the object
    pub bucket: S3Bucket,
    /// Object that was created
    pub object: S3Object,
}

/// `S3Bucket` identifies the bucket of a notification
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct S3Bucket {
    /// Bucket name
    pub name: String,
}

/// `S3Object` identifies the object of a notification
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct S3Object {
    /// Object key
    pub key: String,
}

impl S3EventRecord {
    /// Build a record for the given bucket and key
    pub fn new(bucket: &str, key: &str) -> S3EventRecord {
        S3EventRecord {
            event_source: "aws:s3".into(),
            s3: S3Entity {
                bucket: S3Bucket {
                    name: bucket.into(),
                },
                object: S3Object { key: key.into() },
            },
            ..Default::default()
        }
    }
}
