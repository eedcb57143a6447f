/*
    Process-wide publication of a validated grammar, with rebuild and swap
*/

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::SystemTime;

use log::{info, warn};

use crate::grammar::Grammar;
use crate::parser::{load_file, GrammarResult};

struct Published {
    grammar: Arc<Grammar>,
    modified: Option<SystemTime>,
}

/// The grammar currently in service for one grammar file.
///
/// Readers get an `Arc` and keep using it for as long as they like. A
/// rebuild happens off to the side and only replaces the published grammar
/// once loading and every validation pass have succeeded.
pub struct SharedGrammar {
    path: PathBuf,
    published: RwLock<Published>,
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

impl SharedGrammar {
    /// Builds the first grammar. Failing here means there is nothing to serve.
    pub fn open<P: AsRef<Path>>(path: P) -> GrammarResult<Self> {
        let path = path.as_ref().to_path_buf();
        let modified = modified_time(&path);
        let grammar = load_file(&path)?;

        Ok(SharedGrammar {
            path,
            published: RwLock::new(Published {
                grammar: Arc::new(grammar),
                modified,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn current(&self) -> Arc<Grammar> {
        let published = self.published.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&published.grammar)
    }

    /// Rebuilds from the file and swaps the result in. On failure the
    /// previous grammar stays in service and the error is returned.
    pub fn reload(&self) -> GrammarResult<Arc<Grammar>> {
        let modified = modified_time(&self.path);
        let grammar = match load_file(&self.path) {
            Ok(grammar) => Arc::new(grammar),
            Err(e) => {
                warn!("keeping previous grammar, rebuild of {} failed: {}", self.path.display(), e);
                return Err(e);
            }
        };

        let mut published = self.published.write().unwrap_or_else(PoisonError::into_inner);
        published.grammar = Arc::clone(&grammar);
        published.modified = modified;
        info!("published new grammar from {}", self.path.display());

        Ok(grammar)
    }

    /// Rebuilds only when the file's modification time has changed since the
    /// published grammar was read. Returns whether a new grammar went live.
    pub fn refresh(&self) -> GrammarResult<bool> {
        let modified = modified_time(&self.path);
        let unchanged = {
            let published = self.published.read().unwrap_or_else(PoisonError::into_inner);
            modified.is_some() && published.modified == modified
        };
        if unchanged {
            return Ok(false);
        }

        self.reload().map(|_| true)
    }
}
