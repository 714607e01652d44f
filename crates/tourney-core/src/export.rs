//! Export of a recorded session history
//!
//! A history is the event stream of one session as written by a
//! [`JsonLinesSink`](crate::events::JsonLinesSink).

use crate::error::ExportError;
use crate::events::{Event, EventPayload};
use crate::scoring::{COMPONENT_BASE, COMPOSITE_SCORE};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::BufRead;
use tourney_graph::{GraphSnapshot, VersionNode};

/// Header row of the scoreboard CSV
pub const SCOREBOARD_HEADER: &str = "version_id,score,cost_usd,status";

/// Read a JSON-lines history; blank lines are skipped
///
/// # Errors
/// - `ExportError::Io` if reading fails
/// - `ExportError::MalformedRecord` for a line that is not an event record
pub fn read_history(reader: impl BufRead) -> Result<Vec<Event>, ExportError> {
    let mut events = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let event = serde_json::from_str(&line).map_err(|source| ExportError::MalformedRecord {
            line: index + 1,
            source,
        })?;
        events.push(event);
    }
    Ok(events)
}

/// Metadata of an exported version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMetadata {
    /// Session the version came from
    pub session_id: String,
    /// Export time
    pub exported_at: DateTime<Utc>,
    /// Composite score of the version
    pub score: f64,
}

/// Best version of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestVersion {
    /// Provenance
    pub metadata: ExportMetadata,
    /// The node as of the last snapshot
    pub node: VersionNode,
}

/// Highest-scoring node of the last snapshot
///
/// Scores come from `metric-update` events and fall back to the node's own
/// score. Ties go to the node that appears first in the snapshot.
///
/// # Errors
/// - `ExportError::NoVersions` if no snapshot holds a node
pub fn export_best(history: &[Event]) -> Result<BestVersion, ExportError> {
    let snapshot = last_snapshot(history).ok_or(ExportError::NoVersions)?;
    let scores = composite_scores(history);

    let mut best: Option<(&VersionNode, f64)> = None;
    for node in &snapshot.nodes {
        let score = scores.get(node.id()).copied().unwrap_or_else(|| node.score());
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((node, score));
        }
    }
    let (node, score) = best.ok_or(ExportError::NoVersions)?;

    Ok(BestVersion {
        metadata: ExportMetadata {
            session_id: session_id(history),
            exported_at: Utc::now(),
            score,
        },
        node: node.clone(),
    })
}

/// Scoreboard CSV, best first
///
/// One row per scored node. Cost and status come from the latest snapshot
/// holding the node, `0.00` and `unknown` otherwise.
#[must_use]
pub fn export_scoreboard(history: &[Event]) -> String {
    let mut rows: Vec<(String, f64)> = Vec::new();
    for (id, score) in score_updates(history) {
        match rows.iter_mut().find(|(seen, _)| *seen == id) {
            Some(row) => row.1 = score,
            None => rows.push((id, score)),
        }
    }
    rows.sort_by(|a, b| b.1.total_cmp(&a.1));

    let mut latest: HashMap<&str, &VersionNode> = HashMap::new();
    for event in history {
        if let EventPayload::GraphUpdate(snapshot) = &event.payload {
            for node in &snapshot.nodes {
                latest.insert(node.id(), node);
            }
        }
    }

    std::iter::once(SCOREBOARD_HEADER.to_string())
        .chain(rows.into_iter().map(|(id, score)| {
            let (cost, status) = latest
                .get(id.as_str())
                .map_or((0.0, "unknown"), |node| (node.cost_usd(), node.status().as_str()));
            format!("{id},{score:.3},{cost:.2},{status}")
        }))
        .collect::<Vec<_>>()
        .join("\n")
}

fn last_snapshot(history: &[Event]) -> Option<&GraphSnapshot> {
    history.iter().rev().find_map(|event| match &event.payload {
        EventPayload::GraphUpdate(snapshot) if !snapshot.nodes.is_empty() => Some(snapshot),
        _ => None,
    })
}

fn score_updates(history: &[Event]) -> impl Iterator<Item = (String, f64)> + '_ {
    history.iter().filter_map(|event| match &event.payload {
        EventPayload::MetricUpdate(update) => {
            let score = update
                .metrics
                .get(COMPOSITE_SCORE)
                .or_else(|| update.metrics.get(COMPONENT_BASE))
                .copied()
                .unwrap_or(0.0);
            Some((update.version_id.clone(), score))
        }
        _ => None,
    })
}

fn composite_scores(history: &[Event]) -> HashMap<String, f64> {
    score_updates(history).collect()
}

fn session_id(history: &[Event]) -> String {
    history
        .iter()
        .map(|event| event.session_id.as_str())
        .find(|id| !id.is_empty())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::MetricUpdate;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;
    use tourney_graph::{NodeStatus, VersionGraph};

    fn graph_event(nodes: Vec<VersionNode>) -> Event {
        let mut graph = VersionGraph::new();
        for node in nodes {
            graph.add_node(node).unwrap();
        }
        Event::new("s-1", EventPayload::graph(&graph))
    }

    fn update(id: &str, composite: f64) -> Event {
        Event::new(
            "s-1",
            EventPayload::MetricUpdate(MetricUpdate {
                version_id: id.to_string(),
                metrics: BTreeMap::from([(COMPOSITE_SCORE.to_string(), composite)]),
            }),
        )
    }

    fn history() -> Vec<Event> {
        vec![
            graph_event(vec![VersionNode::new("plan-1", "Plan").with_score(0.75)]),
            graph_event(vec![
                VersionNode::new("plan-1", "Plan").with_score(0.75),
                VersionNode::new("code-2", "Variant")
                    .with_score(0.9)
                    .with_cost(4.2)
                    .with_status(NodeStatus::Succeeded),
            ]),
            update("code-2", 0.81234),
            update("plan-1", 0.6),
            update("ghost-9", 0.5),
        ]
    }

    #[test]
    fn best_uses_composite_scores() {
        let best = export_best(&history()).unwrap();
        assert_eq!(best.node.id(), "code-2");
        assert!((best.metadata.score - 0.81234).abs() < 1e-12);
        assert_eq!(best.metadata.session_id, "s-1");
    }

    #[test]
    fn best_falls_back_to_node_score() {
        let events = vec![graph_event(vec![
            VersionNode::new("a", "A").with_score(0.2),
            VersionNode::new("b", "B").with_score(0.7),
        ])];
        assert_eq!(export_best(&events).unwrap().node.id(), "b");
    }

    #[test]
    fn best_without_nodes_fails() {
        assert!(matches!(export_best(&[]), Err(ExportError::NoVersions)));
        let empty = vec![graph_event(Vec::new())];
        assert!(matches!(export_best(&empty), Err(ExportError::NoVersions)));
    }

    #[test]
    fn best_serializes_metadata_camel_case() {
        let value = serde_json::to_value(export_best(&history()).unwrap()).unwrap();
        assert!(value["metadata"]["exportedAt"].is_string());
        assert_eq!(value["metadata"]["sessionId"], "s-1");
        assert_eq!(value["node"]["id"], "code-2");
    }

    #[test]
    fn scoreboard_rows() {
        let csv = export_scoreboard(&history());
        assert_eq!(
            csv,
            "version_id,score,cost_usd,status\n\
             code-2,0.812,4.20,succeeded\n\
             plan-1,0.600,0.00,pending\n\
             ghost-9,0.500,0.00,unknown"
        );
    }

    #[test]
    fn scoreboard_keeps_latest_update_per_node() {
        let mut events = history();
        events.push(update("plan-1", 0.95));
        let csv = export_scoreboard(&events);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], "plan-1,0.950,0.00,pending");
        assert!(!csv.ends_with('\n'));
    }

    #[test]
    fn scoreboard_without_updates_is_header_only() {
        assert_eq!(export_scoreboard(&[]), SCOREBOARD_HEADER);
    }

    #[test]
    fn history_lines_are_parsed() {
        let lines: Vec<String> = history()
            .iter()
            .map(|e| serde_json::to_string(e).unwrap())
            .collect();
        let raw = format!("{}\n\n{}\n", lines[0], lines[2]);
        let events = read_history(raw.as_bytes()).unwrap();
        assert_eq!(events.len(), 2);

        let err = read_history("{\"type\": \"log\"}\nnot json\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ExportError::MalformedRecord { line: 1, .. }));
    }
}
