use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    db::RankStore,
    error::{AppError, AppResult},
    models::{ComparisonOutcome, NewRankedItem, PlacementProgress, RankedItem},
    services::ranking::RankMaintainer,
};

/// Binary-insertion search for one new title.
///
/// Holds a snapshot of the title's partition in rank order and the half-open
/// range `[lower, upper)` of positions the title can still land in. Each
/// answer halves the range; once it is empty the title belongs at
/// `lower + 1`. At most `ceil(log2(N + 1))` answers are needed.
#[derive(Debug, Clone)]
pub struct PlacementSession {
    candidate: NewRankedItem,
    peers: Vec<RankedItem>,
    lower: usize,
    upper: usize,
    comparisons: u32,
}

impl PlacementSession {
    pub fn start(candidate: NewRankedItem, mut peers: Vec<RankedItem>) -> Self {
        peers.sort_by_key(|peer| peer.rank);
        let upper = peers.len();
        Self {
            candidate,
            peers,
            lower: 0,
            upper,
            comparisons: 0,
        }
    }

    pub fn candidate(&self) -> &NewRankedItem {
        &self.candidate
    }

    pub fn comparisons(&self) -> u32 {
        self.comparisons
    }

    pub fn is_done(&self) -> bool {
        self.lower >= self.upper
    }

    /// Peer the candidate must be compared against next
    pub fn opponent(&self) -> Option<&RankedItem> {
        if self.is_done() {
            None
        } else {
            self.peers.get(self.midpoint())
        }
    }

    /// 1-based insertion rank once the search has finished
    pub fn insertion_rank(&self) -> Option<u32> {
        self.is_done().then(|| self.lower as u32 + 1)
    }

    /// Applies one user answer and narrows the search range
    pub fn record(&mut self, outcome: ComparisonOutcome) -> AppResult<()> {
        if self.is_done() {
            return Err(AppError::InvalidInput(
                "Placement already finished, no comparison pending".to_string(),
            ));
        }

        let mid = self.midpoint();
        match outcome {
            ComparisonOutcome::Better => self.upper = mid,
            ComparisonOutcome::Worse => self.lower = mid + 1,
        }
        self.comparisons += 1;
        Ok(())
    }

    /// Record the session produces once finished
    pub fn into_ranked(self) -> Option<RankedItem> {
        let rank = self.insertion_rank()?;
        Some(self.candidate.into_ranked(rank, self.comparisons))
    }

    fn midpoint(&self) -> usize {
        self.lower + (self.upper - self.lower) / 2
    }
}

/// Runs placement sessions against the rank store.
///
/// Sessions are kept in memory until they finish or are cancelled. Nothing is
/// written to the store before the final answer, so an abandoned session
/// leaves the ranking untouched. At most one session per media type should be
/// active at a time; concurrent sessions on one partition are not merged.
#[derive(Clone)]
pub struct PlacementService {
    store: Arc<dyn RankStore>,
    maintainer: RankMaintainer,
    sessions: Arc<RwLock<HashMap<Uuid, PlacementSession>>>,
}

impl PlacementService {
    pub fn new(store: Arc<dyn RankStore>) -> Self {
        Self {
            maintainer: RankMaintainer::new(store.clone()),
            store,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Starts placing a new title.
    ///
    /// Fails with `DuplicateItem` before any comparison if the title is already
    /// ranked. An empty partition places the title at rank 1 immediately.
    pub async fn start(&self, candidate: NewRankedItem) -> AppResult<PlacementProgress> {
        if candidate.catalog_id.trim().is_empty() || candidate.title.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Catalog id and title are required".to_string(),
            ));
        }

        if self
            .store
            .find_by_catalog_id(&candidate.catalog_id, candidate.media_type)
            .await?
            .is_some()
        {
            tracing::info!(
                catalog_id = %candidate.catalog_id,
                media_type = %candidate.media_type,
                "Rejected placement of already ranked title"
            );
            return Err(AppError::DuplicateItem {
                catalog_id: candidate.catalog_id,
                media_type: candidate.media_type,
            });
        }

        let peers = self.store.list_partition(candidate.media_type).await?;
        let session = PlacementSession::start(candidate, peers);

        if session.is_done() {
            let item = self.commit(session).await?;
            return Ok(PlacementProgress::Placed { item });
        }

        let session_id = Uuid::new_v4();
        let progress = Self::comparing(session_id, &session)?;

        tracing::info!(
            session_id = %session_id,
            catalog_id = %session.candidate().catalog_id,
            media_type = %session.candidate().media_type,
            tier = %session.candidate().tier,
            peers = session.peers.len(),
            "Placement session started"
        );

        self.sessions.write().await.insert(session_id, session);
        Ok(progress)
    }

    /// Current state of an unfinished session
    pub async fn current(&self, session_id: Uuid) -> AppResult<PlacementProgress> {
        let sessions = self.sessions.read().await;
        let session = sessions
            .get(&session_id)
            .ok_or_else(|| session_not_found(session_id))?;
        Self::comparing(session_id, session)
    }

    /// Applies the user's answer to the pending comparison.
    ///
    /// When the search finishes the title is inserted and the session is
    /// dropped.
    pub async fn decide(
        &self,
        session_id: Uuid,
        outcome: ComparisonOutcome,
    ) -> AppResult<PlacementProgress> {
        let finished = {
            let mut sessions = self.sessions.write().await;
            let session = sessions
                .get_mut(&session_id)
                .ok_or_else(|| session_not_found(session_id))?;
            session.record(outcome)?;

            tracing::debug!(
                session_id = %session_id,
                outcome = ?outcome,
                comparisons = session.comparisons(),
                "Comparison recorded"
            );

            if !session.is_done() {
                return Self::comparing(session_id, session);
            }
            sessions.remove(&session_id)
        };

        let session = finished.ok_or_else(|| session_not_found(session_id))?;
        let item = self.commit(session).await?;
        Ok(PlacementProgress::Placed { item })
    }

    /// Abandons a session without touching the store
    pub async fn cancel(&self, session_id: Uuid) -> AppResult<()> {
        let removed = self.sessions.write().await.remove(&session_id);
        match removed {
            Some(session) => {
                tracing::info!(
                    session_id = %session_id,
                    comparisons = session.comparisons(),
                    "Placement session cancelled"
                );
                Ok(())
            }
            None => Err(session_not_found(session_id)),
        }
    }

    pub async fn active_sessions(&self) -> usize {
        self.sessions.read().await.len()
    }

    async fn commit(&self, session: PlacementSession) -> AppResult<RankedItem> {
        let item = session
            .into_ranked()
            .ok_or_else(|| AppError::Internal("Committed an unfinished placement".to_string()))?;
        let rank = item.rank;
        self.maintainer.insert_at(item, rank).await
    }

    fn comparing(session_id: Uuid, session: &PlacementSession) -> AppResult<PlacementProgress> {
        let opponent = session
            .opponent()
            .ok_or_else(|| AppError::Internal("Placement has no pending comparison".to_string()))?;
        Ok(PlacementProgress::Comparing {
            session_id,
            candidate_title: session.candidate().title.clone(),
            opponent: opponent.clone(),
            comparison_number: session.comparisons() + 1,
        })
    }
}

fn session_not_found(session_id: Uuid) -> AppError {
    AppError::NotFound(format!("Placement session {} not found", session_id))
}
