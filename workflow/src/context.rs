use models::{ScanId, ScanSession};

/// Explicit hand-off of the most recent terminal scan between the part of
/// the program that ran it and the part that displays it.
#[derive(Clone, Debug, Default)]
pub struct SessionContext {
    latest: Option<ScanSession>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep `session` as the latest result. Returns `false` (and keeps the
    /// previous one) when the session is not terminal yet.
    pub fn store(&mut self, session: ScanSession) -> bool {
        if !session.is_terminal() {
            return false;
        }
        self.latest = Some(session);
        true
    }

    /// `latest` always resolves to the stored session; a remote id only
    /// when it matches the stored one.
    pub fn resolve(&self, id: &ScanId) -> Option<&ScanSession> {
        let latest = self.latest.as_ref()?;
        match id {
            ScanId::Latest => Some(latest),
            ScanId::Remote(_) if latest.id() == id => Some(latest),
            ScanId::Remote(_) => None,
        }
    }

    pub fn take(&mut self) -> Option<ScanSession> {
        self.latest.take()
    }
}
