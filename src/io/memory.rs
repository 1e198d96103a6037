use super::{ByteRange, ObjectRef, RangeFetcher};
use anyhow::{Result, bail};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;

/// In-memory object store, mainly useful for tests and demos
#[derive(Default, Clone)]
pub struct MemoryFetcher {
    objects: HashMap<ObjectRef, Arc<[u8]>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) an object
    pub fn insert(&mut self, object: ObjectRef, data: impl Into<Vec<u8>>) {
        let data: Vec<u8> = data.into();
        self.objects.insert(object, data.into());
    }

    /// Builder-style variant of [`insert`](Self::insert)
    pub fn with_object(mut self, object: ObjectRef, data: impl Into<Vec<u8>>) -> Self {
        self.insert(object, data);
        self
    }

    fn get(&self, object: &ObjectRef) -> Result<&Arc<[u8]>> {
        match self.objects.get(object) {
            Some(data) => Ok(data),
            None => bail!("no such object: {}", object),
        }
    }
}

impl RangeFetcher for MemoryFetcher {
    type Body = Cursor<Vec<u8>>;

    fn head_size(&self, object: &ObjectRef) -> Result<u64> {
        Ok(self.get(object)?.len() as u64)
    }

    fn fetch_range(&self, object: &ObjectRef, range: ByteRange) -> Result<Self::Body> {
        let data = self.get(object)?;
        let size = data.len() as u64;
        if range.start >= size {
            bail!("range {} not satisfiable for {} of {} bytes", range, object, size);
        }
        let end = range.end.min(size - 1);
        Ok(Cursor::new(data[range.start as usize..=end as usize].to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn serves_clamped_ranges() -> Result<()> {
        let object = ObjectRef::new("b", "k");
        let fetcher = MemoryFetcher::new().with_object(object.clone(), b"abcdef".to_vec());

        assert_eq!(fetcher.head_size(&object)?, 6);

        let mut body = fetcher.fetch_range(&object, ByteRange::new(4, 100))?;
        let mut got = Vec::new();
        body.read_to_end(&mut got)?;
        assert_eq!(got, b"ef");
        Ok(())
    }

    #[test]
    fn rejects_unknown_objects_and_ranges() {
        let object = ObjectRef::new("b", "k");
        let fetcher = MemoryFetcher::new().with_object(object.clone(), b"abc".to_vec());

        assert!(fetcher.head_size(&ObjectRef::new("b", "missing")).is_err());
        assert!(fetcher.fetch_range(&object, ByteRange::new(3, 5)).is_err());
    }
}
