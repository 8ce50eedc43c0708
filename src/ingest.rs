//! Building a road network graph from link records.
//!
//! Links are read from an OS Open Roads style GML document or from a JSON list, then validated
//! and inserted into a [`Graph<String>`]. A link without a usable length fails the whole
//! ingestion: a missing weight must never reach the shortest path computations.

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use quick_xml::{
    events::{BytesStart, Event},
    Reader,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::{
    edge::Link,
    error::{Error, Result},
    graph::{Graph, NodeAttributes},
};

/// A single network link as supplied at the ingestion boundary.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RoadLink {
    pub start_node: String,
    pub end_node: String,
    #[serde(default)]
    pub length: Option<f64>,
    #[serde(default)]
    pub name: Option<String>,
    /// `(easting, northing)` of the start node.
    #[serde(default)]
    pub start_coords: Option<(f64, f64)>,
    /// `(easting, northing)` of the end node.
    #[serde(default)]
    pub end_coords: Option<(f64, f64)>,
}

/// Figures gathered while ingesting links.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct IngestStats {
    /// Number of links read, duplicates included.
    pub links: usize,
    pub min_length: Option<f64>,
    pub max_length: Option<f64>,
}

impl IngestStats {
    fn record(&mut self, length: f64) {
        self.links += 1;
        let min = self.min_length.map_or(length, |min| min.min(length));
        let max = self.max_length.map_or(length, |max| max.max(length));
        self.min_length = Some(min);
        self.max_length = Some(max);
    }
}

/// An ingested network and the statistics gathered while building it.
#[derive(Clone, Debug)]
pub struct Network {
    pub graph: Graph<String>,
    pub stats: IngestStats,
}

/// Builds a network from `links`.
///
/// Each link becomes an edge weighted by its length, named after it when a name is given.
/// Coordinates update the attributes of the corresponding endpoint. A later link between the
/// same pair of nodes replaces the earlier one.
///
/// # Errors
///
/// Returns [`Error::InvalidEdgeWeight`] for the first link whose length is missing, negative or
/// not finite.
///
/// # Examples
///
/// ```
/// use severance::ingest::{ingest, RoadLink};
///
/// let links = vec![RoadLink {
///     start_node: "a".to_owned(),
///     end_node: "b".to_owned(),
///     length: Some(120.0),
///     ..Default::default()
/// }];
///
/// let network = ingest(links).unwrap();
/// assert_eq!(network.graph.edge_count(), 1);
/// assert_eq!(network.stats.max_length, Some(120.0));
/// ```
pub fn ingest<I>(links: I) -> Result<Network>
where
    I: IntoIterator<Item = RoadLink>,
{
    let mut graph = Graph::new();
    let mut stats = IngestStats::default();

    for link in links {
        let length = validate_length(&link)?;
        stats.record(length);

        if let Some((easting, northing)) = link.start_coords {
            graph.update_node_attributes(
                link.start_node.clone(),
                &NodeAttributes::at(easting, northing),
            );
        }
        if let Some((easting, northing)) = link.end_coords {
            graph.update_node_attributes(
                link.end_node.clone(),
                &NodeAttributes::at(easting, northing),
            );
        }

        let edge_link = match link.name {
            Some(name) => Link::new(length).with_name(name),
            None => Link::new(length),
        };
        graph.add_edge(link.start_node, link.end_node, edge_link);
    }

    info!(
        links = stats.links,
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "ingested road links"
    );

    Ok(Network { graph, stats })
}

/// Reads the links of `path` and ingests them, see [`load_links`] and [`ingest`].
pub fn load_network(path: &Path) -> Result<Network> {
    ingest(load_links(path)?)
}

/// Reads links from a file, picking the reader from the extension: `.gml` and `.xml` are parsed
/// with [`read_gml`], `.json` with [`read_json`].
#[instrument]
pub fn load_links(path: &Path) -> Result<Vec<RoadLink>> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let open = || {
        File::open(path).map(BufReader::new).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })
    };

    let links = match extension.as_deref() {
        Some("gml" | "xml") => read_gml(open()?)?,
        Some("json") => read_json(open()?)?,
        _ => {
            return Err(Error::UnsupportedFormat {
                path: path.to_path_buf(),
            })
        }
    };

    debug!(count = links.len(), "read road links");

    Ok(links)
}

/// Reads a JSON array of [`RoadLink`] records.
pub fn read_json<R: BufRead>(reader: R) -> Result<Vec<RoadLink>> {
    Ok(serde_json::from_reader(reader)?)
}

/// Reads the `RoadLink` features of a GML document.
///
/// Elements are matched on their local name, whatever their namespace prefix. For each link:
///
/// - `startNode` and `endNode` give the endpoints through their `xlink:href` reference,
/// - `length` gives the length, a value that doesn't parse as a number is treated as missing,
/// - `name1` gives the name,
/// - the first and last positions of `posList` give the endpoint coordinates.
pub fn read_gml<R: BufRead>(reader: R) -> Result<Vec<RoadLink>> {
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(true);

    let mut buf = Vec::new();
    let mut links = Vec::new();
    let mut pending: Option<PendingLink> = None;
    let mut field: Option<Field> = None;

    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Start(element) => match element.local_name().as_ref() {
                b"RoadLink" => pending = Some(PendingLink::default()),
                b"length" => field = Some(Field::Length),
                b"name1" => field = Some(Field::Name),
                b"posList" => field = Some(Field::Positions),
                _ => read_endpoint(&element, pending.as_mut())?,
            },
            Event::Empty(element) => read_endpoint(&element, pending.as_mut())?,
            Event::Text(text) => {
                if let (Some(link), Some(field)) = (pending.as_mut(), field) {
                    link.append(field, &text.unescape()?);
                }
            }
            Event::End(element) => match element.local_name().as_ref() {
                b"RoadLink" => {
                    if let Some(link) = pending.take() {
                        links.push(link.finish(links.len())?);
                    }
                }
                b"length" | b"name1" | b"posList" => field = None,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(links)
}

#[derive(Clone, Copy, Debug)]
enum Field {
    Length,
    Name,
    Positions,
}

/// A `RoadLink` element being read.
#[derive(Debug, Default)]
struct PendingLink {
    start_node: Option<String>,
    end_node: Option<String>,
    length: String,
    name: String,
    positions: String,
}

impl PendingLink {
    fn append(&mut self, field: Field, text: &str) {
        let target = match field {
            Field::Length => &mut self.length,
            Field::Name => &mut self.name,
            Field::Positions => &mut self.positions,
        };
        if !target.is_empty() {
            target.push(' ');
        }
        target.push_str(text);
    }

    fn finish(self, index: usize) -> Result<RoadLink> {
        let malformed = |reason: &str| Error::MalformedLink {
            index,
            reason: reason.to_owned(),
        };

        let start_node = self.start_node.ok_or_else(|| malformed("missing startNode"))?;
        let end_node = self.end_node.ok_or_else(|| malformed("missing endNode"))?;

        let positions = self
            .positions
            .split_whitespace()
            .map(str::parse::<f64>)
            .collect::<Result<Vec<f64>, _>>()
            .map_err(|_| malformed("posList contains a value that isn't a number"))?;
        if positions.len() % 2 != 0 {
            return Err(malformed("posList has an odd number of values"));
        }
        let mut points = positions.chunks_exact(2).map(|p| (p[0], p[1]));

        Ok(RoadLink {
            start_node,
            end_node,
            length: self.length.trim().parse().ok(),
            name: Some(self.name).filter(|name| !name.is_empty()),
            start_coords: points.next(),
            end_coords: points.next_back(),
        })
    }
}

/// Records the endpoint referenced by a `startNode` or `endNode` element.
fn read_endpoint(element: &BytesStart<'_>, pending: Option<&mut PendingLink>) -> Result<()> {
    let Some(link) = pending else {
        return Ok(());
    };

    let slot = match element.local_name().as_ref() {
        b"startNode" => &mut link.start_node,
        b"endNode" => &mut link.end_node,
        _ => return Ok(()),
    };

    for attribute in element.attributes() {
        let attribute = attribute.map_err(quick_xml::Error::from)?;
        if attribute.key.local_name().as_ref() == b"href" {
            let value = attribute.unescape_value()?;
            *slot = Some(node_reference(&value).to_owned());
        }
    }

    Ok(())
}

/// Drops the two-character prefix that precedes the node identifier in link references.
fn node_reference(href: &str) -> &str {
    href.char_indices().nth(2).map_or("", |(i, _)| &href[i..])
}

fn validate_length(link: &RoadLink) -> Result<f64> {
    match link.length {
        Some(length) if length.is_finite() && length >= 0.0 => Ok(length),
        length => Err(Error::InvalidEdgeWeight {
            start: link.start_node.clone(),
            end: link.end_node.clone(),
            length,
        }),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    const GML: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<gml:FeatureCollection xmlns:gml="http://www.opengis.net/gml/3.2"
    xmlns:road="http://namespaces.os.uk/Open/Roads/1.0"
    xmlns:net="urn:x-inspire:specification:gmlas:Network:3.2"
    xmlns:xlink="http://www.w3.org/1999/xlink">
  <gml:featureMember>
    <road:RoadLink gml:id="idL1">
      <net:centrelineGeometry>
        <gml:LineString>
          <gml:posList srsDimension="2" count="3">100.0 200.0 150.0 250.0 180.0 260.0</gml:posList>
        </gml:LineString>
      </net:centrelineGeometry>
      <net:startNode xlink:href="#_N1"/>
      <net:endNode xlink:href="#_N2"/>
      <road:length uom="m">85</road:length>
      <road:name1>Station Road</road:name1>
    </road:RoadLink>
  </gml:featureMember>
  <gml:featureMember>
    <road:RoadLink gml:id="idL2">
      <net:startNode xlink:href="#_N2"/>
      <net:endNode xlink:href="#_N3"/>
      <road:length uom="m">40</road:length>
    </road:RoadLink>
  </gml:featureMember>
</gml:FeatureCollection>
"##;

    fn link(start: &str, end: &str, length: Option<f64>) -> RoadLink {
        RoadLink {
            start_node: start.to_owned(),
            end_node: end.to_owned(),
            length,
            ..Default::default()
        }
    }

    #[test]
    fn read_gml_links() {
        let links = read_gml(GML.as_bytes()).unwrap();

        assert_eq!(
            links,
            vec![
                RoadLink {
                    start_node: "N1".to_owned(),
                    end_node: "N2".to_owned(),
                    length: Some(85.0),
                    name: Some("Station Road".to_owned()),
                    start_coords: Some((100.0, 200.0)),
                    end_coords: Some((180.0, 260.0)),
                },
                link("N2", "N3", Some(40.0)),
            ]
        );
    }

    #[test]
    fn gml_without_length() {
        let gml = r##"<road:RoadLink xmlns:road="r" xmlns:net="n" xmlns:xlink="x">
            <net:startNode xlink:href="#_A"/><net:endNode xlink:href="#_B"/>
        </road:RoadLink>"##;

        let links = read_gml(gml.as_bytes()).unwrap();
        assert_eq!(links, vec![link("A", "B", None)]);

        assert!(matches!(
            ingest(links),
            Err(Error::InvalidEdgeWeight { length: None, .. })
        ));
    }

    #[test]
    fn gml_missing_endpoint() {
        let gml = r##"<road:RoadLink xmlns:road="r" xmlns:net="n" xmlns:xlink="x">
            <net:startNode xlink:href="#_A"/><road:length>3</road:length>
        </road:RoadLink>"##;

        assert!(matches!(
            read_gml(gml.as_bytes()),
            Err(Error::MalformedLink { index: 0, .. })
        ));
    }

    #[test]
    fn read_json_links() {
        let json = r#"[
            {"start_node": "a", "end_node": "b", "length": 12.5, "start_coords": [1.0, 2.0]},
            {"start_node": "b", "end_node": "c", "length": 3, "name": "Mill Lane"}
        ]"#;

        let links = read_json(json.as_bytes()).unwrap();

        assert_eq!(links.len(), 2);
        assert_eq!(links[0].start_coords, Some((1.0, 2.0)));
        assert_eq!(links[1].name.as_deref(), Some("Mill Lane"));
        assert_eq!(links[1].length, Some(3.0));
    }

    #[test]
    fn ingest_builds_graph() {
        let mut first = link("a", "b", Some(10.0));
        first.name = Some("Quay Street".to_owned());
        first.start_coords = Some((1.0, 1.0));
        first.end_coords = Some((2.0, 2.0));
        let links = vec![first, link("b", "c", Some(4.0)), link("c", "a", Some(25.0))];

        let network = ingest(links).unwrap();
        let graph = &network.graph;

        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(
            graph.link(&"b".to_owned(), &"a".to_owned()).map(Link::name),
            Some("Quay Street")
        );
        assert_eq!(
            graph.node_attributes(&"a".to_owned()),
            Some(&NodeAttributes::at(1.0, 1.0))
        );
        assert_eq!(
            network.stats,
            IngestStats {
                links: 3,
                min_length: Some(4.0),
                max_length: Some(25.0),
            }
        );
    }

    #[test]
    fn duplicate_links_keep_the_last_length() {
        let network = ingest(vec![link("x", "y", Some(3.0)), link("y", "x", Some(7.0))]).unwrap();

        assert_eq!(network.graph.edge_count(), 1);
        assert_eq!(
            network
                .graph
                .link(&"x".to_owned(), &"y".to_owned())
                .map(Link::weight),
            Some(7.0)
        );
        assert_eq!(network.stats.links, 2);
    }

    #[rstest]
    #[case::missing(None)]
    #[case::negative(Some(-1.0))]
    #[case::not_a_number(Some(f64::NAN))]
    #[case::infinite(Some(f64::INFINITY))]
    fn invalid_lengths_are_rejected(#[case] length: Option<f64>) {
        let links = vec![link("a", "b", Some(1.0)), link("b", "c", length)];

        match ingest(links) {
            Err(Error::InvalidEdgeWeight { start, end, .. }) => {
                assert_eq!((start.as_str(), end.as_str()), ("b", "c"));
            }
            other => panic!("expected an invalid edge weight, got {other:?}"),
        }
    }

    #[test]
    fn zero_length_is_accepted() {
        assert!(ingest(vec![link("a", "b", Some(0.0))]).is_ok());
    }

    #[test]
    fn unsupported_extension() {
        assert!(matches!(
            load_links(Path::new("roads.csv")),
            Err(Error::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn missing_file() {
        assert!(matches!(
            load_links(Path::new("does/not/exist.gml")),
            Err(Error::Io { .. })
        ));
    }

    #[test]
    fn node_references() {
        assert_eq!(node_reference("#_N1"), "N1");
        assert_eq!(node_reference("#"), "");
    }
}
