// File: src/persistence.rs
use crate::codec::LmStateCodec;
use crate::error::{LmStateError, LmStateResult};
use crate::verify::Verifier;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::marker::PhantomData;
use std::path::Path;
use tempfile::NamedTempFile;

/// Iterates the records of one kind in a stream until it ends cleanly.
/// Stops after the first error; a corrupt stream yields no further records.
pub struct StateReader<R, S> {
    source: R,
    verifier: Verifier,
    failed: bool,
    _kind: PhantomData<S>,
}

impl<R: Read, S: LmStateCodec> StateReader<R, S> {
    pub fn new(source: R, verifier: Verifier) -> Self {
        Self {
            source,
            verifier,
            failed: false,
            _kind: PhantomData,
        }
    }
}

impl<R: Read, S: LmStateCodec> Iterator for StateReader<R, S> {
    type Item = LmStateResult<S>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match S::read_next(&mut self.source, &mut self.verifier) {
            Ok(Some(state)) => Some(Ok(state)),
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

/// Writes `states` to `path` atomically: a temp file in the same directory is
/// filled and then renamed over `path`, so readers never see a half-written file.
pub fn save_states<S: LmStateCodec>(
    states: &[S],
    path: &Path,
    verifier: &mut Verifier,
) -> LmStateResult<()> {
    let parent_dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent_dir)?;

    let temp_file = NamedTempFile::new_in(parent_dir)?;
    {
        let mut writer = BufWriter::new(temp_file.as_file());
        for state in states {
            state.write_to(&mut writer, verifier)?;
        }
        writer.flush().map_err(|source| LmStateError::Write { what: S::KIND, source })?;
    }

    temp_file.persist(path).map_err(|e| LmStateError::Io(e.error))?;
    tracing::debug!("Saved {} {} records to {}", states.len(), S::KIND, path.display());
    Ok(())
}

pub fn load_states<S: LmStateCodec>(path: &Path, verifier: Verifier) -> LmStateResult<Vec<S>> {
    let file = File::open(path)?;
    let states = StateReader::<_, S>::new(BufReader::new(file), verifier)
        .collect::<LmStateResult<Vec<S>>>()?;
    tracing::debug!("Loaded {} {} records from {}", states.len(), S::KIND, path.display());
    Ok(states)
}
