//! Search flow state for the coverage checker.
//!
//! Each search takes a [`SearchTicket`]. Only the ticket from the most recent
//! `begin` may update the session, so a slow lookup finishing after a newer
//! one cannot overwrite its result.

use tracing::{debug, info};

use super::geocode::Geocoder;
use super::location::{LocationProvider, PositionOptions};
use super::{check, CoverageReport, CoverageZone, GeoPoint, MapView};

#[derive(Debug, Clone, PartialEq)]
pub enum SearchState {
    Idle,
    Searching,
    Done(CoverageReport),
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchTicket {
    generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Current,
    Stale,
}

#[derive(Debug)]
pub struct CoverageSession {
    generation: u64,
    state: SearchState,
    view: MapView,
}

impl Default for CoverageSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CoverageSession {
    pub fn new() -> Self {
        Self {
            generation: 0,
            state: SearchState::Idle,
            view: MapView::default(),
        }
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn view(&self) -> &MapView {
        &self.view
    }

    pub fn is_searching(&self) -> bool {
        matches!(self.state, SearchState::Searching)
    }

    /// Starts a search. Any ticket handed out earlier becomes stale.
    pub fn begin(&mut self) -> SearchTicket {
        self.generation += 1;
        self.state = SearchState::Searching;
        SearchTicket { generation: self.generation }
    }

    pub fn finish(&mut self, ticket: SearchTicket, outcome: Result<CoverageReport, String>) -> Applied {
        if ticket.generation != self.generation {
            debug!(ticket = ticket.generation, current = self.generation, "dropping stale search result");
            return Applied::Stale;
        }

        match outcome {
            Ok(report) => {
                self.view = report.view;
                self.state = SearchState::Done(report);
            }
            Err(message) => self.state = SearchState::Failed(message),
        }
        Applied::Current
    }

    /// Classifies an already known point.
    pub fn check_point(&mut self, zones: &[CoverageZone], point: GeoPoint) -> &SearchState {
        let ticket = self.begin();
        self.finish(ticket, Ok(check(point, zones)));
        &self.state
    }

    /// Geocodes `address` and classifies the first candidate.
    ///
    /// Blank input leaves the session untouched.
    pub fn check_address(
        &mut self,
        geocoder: &dyn Geocoder,
        zones: &[CoverageZone],
        address: &str,
    ) -> &SearchState {
        if address.trim().is_empty() {
            return &self.state;
        }

        let ticket = self.begin();
        let outcome = geocoder
            .locate(address)
            .map(|point| check(point, zones))
            .map_err(|e| {
                info!(error = %e, "address lookup failed");
                e.user_message().to_string()
            });
        self.finish(ticket, outcome);
        &self.state
    }

    pub fn check_location(
        &mut self,
        provider: &dyn LocationProvider,
        zones: &[CoverageZone],
    ) -> &SearchState {
        let ticket = self.begin();
        let outcome = provider
            .current_position(&PositionOptions::default())
            .map(|point| check(point, zones))
            .map_err(|e| {
                info!(error = %e, "device location failed");
                e.user_message().to_string()
            });
        self.finish(ticket, outcome);
        &self.state
    }
}
