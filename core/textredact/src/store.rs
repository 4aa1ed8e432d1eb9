use std::collections::BTreeMap;
use std::fmt;
use std::sync::Mutex;

use serde::Deserialize;

use crate::error::RedactError;

/// Location of an object: a bucket name plus a key within it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectRef {
    /// Bucket name.
    pub bucket: String,
    /// Key within the bucket, already decoded.
    pub key: String,
}

impl ObjectRef {
    /// Reference to `key` in `bucket`.
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Last path segment of the key.
    pub fn file_name(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or(&self.key)
    }

    /// Extension of the file name, without the dot.
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name();
        match name.rfind('.') {
            Some(0) | None => None,
            Some(idx) => Some(&name[idx + 1..]),
        }
    }

    /// Same key in another bucket.
    pub fn in_bucket(&self, bucket: &str) -> ObjectRef {
        ObjectRef::new(bucket, self.key.clone())
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

/// Blob storage addressed by [`ObjectRef`].
pub trait ObjectStore: Send + Sync {
    /// Read the whole object.
    fn get(&self, object: &ObjectRef) -> Result<Vec<u8>, RedactError>;

    /// Create or replace the object with `data`.
    fn put(&self, object: &ObjectRef, data: &[u8], content_type: &str) -> Result<(), RedactError>;

    /// Server-side copy. Overwrites `to` if present.
    fn copy(&self, from: &ObjectRef, to: &ObjectRef) -> Result<(), RedactError>;

    /// Remove the object.
    fn delete(&self, object: &ObjectRef) -> Result<(), RedactError>;
}

/// A mutation applied to a [`MemoryStore`], kept for inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    /// An object was written.
    Put(ObjectRef),
    /// An object was copied.
    Copy {
        /// Source object.
        from: ObjectRef,
        /// Destination object.
        to: ObjectRef,
    },
    /// An object was removed.
    Delete(ObjectRef),
}

/// In-process [`ObjectStore`] that also journals every write.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<ObjectRef, Vec<u8>>>,
    journal: Mutex<Vec<StoreOp>>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object without journaling it.
    pub fn insert(&self, object: ObjectRef, data: Vec<u8>) {
        if let Ok(mut objects) = self.objects.lock() {
            objects.insert(object, data);
        }
    }

    /// Current contents of `object`, if any.
    pub fn contents(&self, object: &ObjectRef) -> Option<Vec<u8>> {
        self.objects.lock().ok()?.get(object).cloned()
    }

    /// Writes applied so far, oldest first.
    pub fn journal(&self) -> Vec<StoreOp> {
        self.journal
            .lock()
            .map(|ops| ops.clone())
            .unwrap_or_default()
    }

    fn record(&self, op: StoreOp) -> Result<(), RedactError> {
        self.journal
            .lock()
            .map_err(|_| RedactError::Storage("journal lock poisoned".into()))?
            .push(op);
        Ok(())
    }

    fn objects(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, BTreeMap<ObjectRef, Vec<u8>>>, RedactError> {
        self.objects
            .lock()
            .map_err(|_| RedactError::Storage("object map lock poisoned".into()))
    }
}

impl ObjectStore for MemoryStore {
    fn get(&self, object: &ObjectRef) -> Result<Vec<u8>, RedactError> {
        self.objects()?
            .get(object)
            .cloned()
            .ok_or_else(|| RedactError::Storage(format!("no such object: {object}")))
    }

    fn put(&self, object: &ObjectRef, data: &[u8], _content_type: &str) -> Result<(), RedactError> {
        self.objects()?.insert(object.clone(), data.to_vec());
        self.record(StoreOp::Put(object.clone()))
    }

    fn copy(&self, from: &ObjectRef, to: &ObjectRef) -> Result<(), RedactError> {
        {
            let mut objects = self.objects()?;
            let data = objects
                .get(from)
                .cloned()
                .ok_or_else(|| RedactError::Storage(format!("no such object: {from}")))?;
            objects.insert(to.clone(), data);
        }
        self.record(StoreOp::Copy {
            from: from.clone(),
            to: to.clone(),
        })
    }

    fn delete(&self, object: &ObjectRef) -> Result<(), RedactError> {
        self.objects()?.remove(object);
        self.record(StoreOp::Delete(object.clone()))
    }
}

/// Object-created notification emitted by the store.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadEvent {
    /// One record per created object.
    #[serde(rename = "Records", default)]
    pub records: Vec<EventRecord>,
}

/// One entry of an [`UploadEvent`].
#[derive(Debug, Clone, Deserialize)]
pub struct EventRecord {
    /// Storage details of the record.
    pub s3: EventEntity,
}

/// Bucket and object named by an [`EventRecord`].
#[derive(Debug, Clone, Deserialize)]
pub struct EventEntity {
    /// Where the object was created.
    pub bucket: EventBucket,
    /// The created object.
    pub object: EventObject,
}

/// Bucket of an event record.
#[derive(Debug, Clone, Deserialize)]
pub struct EventBucket {
    /// Bucket name.
    pub name: String,
}

/// Object of an event record.
#[derive(Debug, Clone, Deserialize)]
pub struct EventObject {
    /// Key as sent, still form-encoded.
    pub key: String,
}

impl UploadEvent {
    /// Parse an event payload.
    pub fn from_json(body: &str) -> Result<Self, RedactError> {
        serde_json::from_str(body).map_err(|e| RedactError::Event(e.to_string()))
    }

    /// The object named by the first record, with its key decoded.
    ///
    /// Later records are ignored; the store emits one record per upload.
    pub fn first_object(&self) -> Result<ObjectRef, RedactError> {
        let record = self
            .records
            .first()
            .ok_or_else(|| RedactError::Event("event has no records".into()))?;
        let key = decode_key(&record.s3.object.key)?;
        Ok(ObjectRef::new(record.s3.bucket.name.clone(), key))
    }
}

/// Undo form encoding of an event key: `+` is a space, `%XX` is a byte.
pub fn decode_key(raw: &str) -> Result<String, RedactError> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|key| key.into_owned())
        .map_err(|e| RedactError::Event(format!("key is not valid UTF-8: {e}")))
}
