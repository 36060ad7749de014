use super::*;
use crate::core::{AdjacencyBounds, BoundType, Rotation};
use approx::assert_relative_eq;
use std::cell::RefCell;

fn seg(points: &[(f64, f64)]) -> Segment {
    Segment::new(points.iter().map(|&(x, y)| DVec2::new(x, y)))
}

/// Stern mit vier Armen um den Ursprung (Ost, Nord, West, Süd im y-oben-System).
fn star() -> (Graph, [SegmentId; 4]) {
    let mut graph = Graph::new();
    let ids = [
        graph.insert(seg(&[(0.0, 0.0), (10.0, 0.0)])).expect("Ost"),
        graph.insert(seg(&[(0.0, 0.0), (0.0, 10.0)])).expect("Nord"),
        graph.insert(seg(&[(0.0, 0.0), (-10.0, 0.0)])).expect("West"),
        graph.insert(seg(&[(0.0, 0.0), (0.0, -10.0)])).expect("Süd"),
    ];
    (graph, ids)
}

fn center(graph: &Graph, segment: SegmentId) -> PointId {
    graph
        .segment(segment)
        .and_then(Segment::start_point)
        .expect("Startpunkt erwartet")
}

#[test]
fn test_zwei_segmente_teilen_einen_punkt() {
    let mut graph = Graph::new();
    let a = graph.insert(seg(&[(0.0, 0.0), (10.0, 0.0)])).unwrap();
    let b = graph.insert(seg(&[(10.3, 0.0), (20.0, 0.0)])).unwrap();

    assert_eq!(graph.point_count(), 3);
    assert_eq!(graph.segment_count(), 2);
    let shared = graph.shared_connection_with(a, b).expect("gemeinsamer Punkt");
    assert_eq!(graph.connection_point(shared).unwrap().connection_count(), 2);
    // Der fusionierte Endpunkt wird auf den vorhandenen Punkt gezogen
    assert_eq!(graph.segment(b).unwrap().first_point(), Some(DVec2::new(10.0, 0.0)));
    assert!(graph.is_last_point_connected_to(a, b));
    assert!(graph.is_first_point_connected_to(b, a));
    assert!(!graph.is_first_point_connected_to(a, b));
}

#[test]
fn test_geschlossene_schleife_erzeugt_einen_punkt() {
    let mut graph = Graph::new();
    let id = graph
        .insert(seg(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 0.2)]))
        .unwrap();

    assert_eq!(graph.point_count(), 1);
    let segment = graph.segment(id).unwrap();
    assert!(segment.is_loop());
    let cp = graph.connection_point(segment.start_point().unwrap()).unwrap();
    assert_eq!(cp.connection_count(), 2);
    assert!(cp.index_of(id, Some(SegmentEnd::Start)).is_some());
    assert!(cp.index_of(id, Some(SegmentEnd::End)).is_some());
    assert_eq!(segment.last_point(), Some(DVec2::ZERO));
}

#[test]
fn test_einfuegen_und_entfernen_ist_rueckgaengig() {
    let mut graph = Graph::new();
    let a = graph.insert(seg(&[(0.0, 0.0), (10.0, 0.0)])).unwrap();
    let bbox = graph.bounding_box();
    let points = graph.point_count();

    let b = graph.insert(seg(&[(10.0, 0.0), (20.0, 5.0)])).unwrap();
    assert_ne!(graph.bounding_box(), bbox);

    let removed = graph.remove(b).expect("Segment erwartet");
    assert!(!removed.is_attached());
    assert_eq!(removed.start_point(), None);
    assert_eq!(graph.bounding_box(), bbox);
    assert_eq!(graph.point_count(), points);
    assert_eq!(graph.segment_count(), 1);
    assert!(graph.remove(b).is_none());

    // Das freigegebene Segment kann erneut eingefügt werden
    let again = graph.insert(removed).unwrap();
    assert_ne!(again, b);
    assert!(graph.is_connected_to(a, again));
}

#[test]
fn test_ungueltige_segmente_werden_abgelehnt() {
    let mut graph = Graph::new();
    assert_eq!(
        graph.insert(seg(&[(1.0, 1.0)])),
        Err(GraphError::NotEnoughPoints(1))
    );

    let mut other = Graph::new();
    let id = other.insert(seg(&[(0.0, 0.0), (1.0, 0.0)])).unwrap();
    let owned = other.segment(id).unwrap().clone();
    assert_eq!(graph.insert(owned), Err(GraphError::AlreadyOwned(other.id())));
    assert!(graph.is_empty());
}

#[test]
fn test_fehlgeschlagenes_einfuegen_wird_zurueckgenommen() {
    let mut graph = Graph::new();
    assert!(matches!(
        graph.insert(seg(&[(0.0, 0.0), (0.0, 0.0)])),
        Err(GraphError::DegenerateAngle { .. })
    ));
    assert_eq!(graph.point_count(), 0);
    assert_eq!(graph.segment_count(), 0);
    assert!(graph.nearest_segment(DVec2::ZERO).is_none());

    // Der Start scheitert, bevor das Ende angeschlossen ist: auch dessen neuer Punkt verschwindet
    assert!(matches!(
        graph.insert(seg(&[(0.0, 0.0), (0.0, 0.0), (5.0, 0.0)])),
        Err(GraphError::DegenerateAngle { .. })
    ));
    assert_eq!(graph.point_count(), 0);
    assert_eq!(graph.segment_count(), 0);
    assert!(graph.nearest_connection(DVec2::new(5.0, 0.0)).is_none());

    let a = graph.insert(seg(&[(0.0, 0.0), (10.0, 0.0)])).unwrap();
    // Beide Enden fallen auf den Endpunkt von `a`, der Winkel ist nicht definiert
    assert!(graph.insert(seg(&[(10.2, 0.0), (10.0, 0.1)])).is_err());
    assert_eq!(graph.point_count(), 2);
    assert_eq!(graph.segment_count(), 1);
    let end = graph.segment(a).unwrap().end_point().unwrap();
    assert_eq!(graph.connection_point(end).unwrap().connection_count(), 1);
}

#[test]
fn test_stern_ist_im_uhrzeigersinn_sortiert() {
    let (graph, [east, north, west, south]) = star();
    let p = center(&graph, east);
    assert_eq!(graph.point_count(), 5);

    let order: Vec<SegmentId> = graph
        .point(p)
        .unwrap()
        .clockwise(&AdjacencyBounds::all())
        .map(|c| c.segment)
        .collect();
    assert_eq!(order, vec![east, south, west, north]);

    let order: Vec<SegmentId> = graph
        .point(p)
        .unwrap()
        .counterclockwise(&AdjacencyBounds::all().starting_at(west, None))
        .map(|c| c.segment)
        .collect();
    assert_eq!(order, vec![west, south, east, north]);
}

#[test]
fn test_linkshaendig_kehrt_den_umlauf_um() {
    let mut graph = Graph::with_options(GraphOptions {
        coordinate_system: crate::shared::CoordinateSystem::LeftHanded,
        ..GraphOptions::default()
    });
    let east = graph.insert(seg(&[(0.0, 0.0), (10.0, 0.0)])).unwrap();
    let south = graph.insert(seg(&[(0.0, 0.0), (0.0, -10.0)])).unwrap();
    let west = graph.insert(seg(&[(0.0, 0.0), (-10.0, 0.0)])).unwrap();

    let order: Vec<SegmentId> = graph
        .point(center(&graph, east))
        .unwrap()
        .clockwise(&AdjacencyBounds::all())
        .map(|c| c.segment)
        .collect();
    assert_eq!(order, vec![west, south, east]);
}

#[test]
fn test_cursor_wird_durch_fremde_aenderung_ungueltig() {
    let (mut graph, [east, north, _, _]) = star();
    let p = center(&graph, east);
    let mut cursor = graph
        .cursor(p, Rotation::Clockwise, &AdjacencyBounds::all())
        .unwrap();
    assert!(cursor.has_next(&graph).unwrap());
    assert_eq!(cursor.next(&graph).unwrap().map(|c| c.segment), Some(east));

    graph.remove(north);
    assert_eq!(cursor.has_next(&graph), Err(GraphError::InvalidatedIterator(p)));
    assert_eq!(cursor.next(&graph), Err(GraphError::InvalidatedIterator(p)));
}

#[test]
fn test_veralteter_cursor_liefert_keinen_iterator() {
    let (mut graph, [east, north, ..]) = star();
    let p = center(&graph, east);
    let stale = graph
        .cursor(p, Rotation::Clockwise, &AdjacencyBounds::all())
        .unwrap();

    graph.remove(north);
    assert!(matches!(
        stale.clone().iter(&graph),
        Err(GraphError::InvalidatedIterator(id)) if id == p
    ));

    let fresh = graph
        .cursor(p, Rotation::Clockwise, &AdjacencyBounds::all())
        .unwrap();
    assert_eq!(fresh.iter(&graph).expect("Iterator erwartet").count(), 3);
}

#[test]
fn test_cursor_remove_bleibt_gueltig() {
    let (mut graph, [east, north, west, south]) = star();
    let p = center(&graph, east);
    let mut cursor = graph
        .cursor(p, Rotation::Clockwise, &AdjacencyBounds::all())
        .unwrap();

    assert_eq!(cursor.remove(&mut graph), Err(GraphError::NoSuchElement));
    cursor.next(&graph).unwrap();
    let removed = cursor.next(&graph).unwrap().expect("Süd erwartet");
    assert_eq!(removed.segment, south);

    assert_eq!(cursor.remove(&mut graph).unwrap(), removed);
    assert_eq!(cursor.remove(&mut graph), Err(GraphError::NoSuchElement));
    assert_eq!(graph.point_count(), 6);
    assert!(!graph.is_connected_to(east, south));

    let rest: Vec<SegmentId> = std::iter::from_fn(|| cursor.next(&graph).unwrap())
        .map(|c| c.segment)
        .collect();
    assert_eq!(rest, vec![west, north]);
}

#[test]
fn test_ankunft_loest_schleifengrenzen_auf() {
    let mut graph = Graph::new();
    let lp = graph
        .insert(seg(&[(0.0, 0.0), (10.0, 0.0), (10.0, -10.0), (0.0, -10.0), (0.0, 0.0)]))
        .unwrap();
    graph.insert(seg(&[(0.0, 0.0), (-10.0, 0.0)])).unwrap();

    let bounds = AdjacencyBounds::all()
        .starting_at(lp, None)
        .with_bound_type(BoundType::IncludeBoth);

    let via_start = graph.begin_point(lp).unwrap();
    assert_eq!(
        via_start.clockwise(&bounds).next(),
        Some(Connection::new(lp, SegmentEnd::Start))
    );
    let via_end = graph.end_point(lp).unwrap();
    assert_eq!(
        via_end.clockwise(&bounds).next(),
        Some(Connection::new(lp, SegmentEnd::End))
    );
    assert_eq!(via_start, via_end);
}

#[test]
fn test_verschmelzen_im_schwerpunkt() {
    let mut graph = Graph::new();
    let a = graph.insert(seg(&[(0.0, 0.0), (-10.0, 0.0)])).unwrap();
    let b = graph.insert(seg(&[(2.0, 0.0), (12.0, 0.0)])).unwrap();
    let c = graph.insert(seg(&[(1.0, 2.0), (1.0, 12.0)])).unwrap();
    assert_eq!(graph.point_count(), 6);

    let handles: Vec<PointHandle> = [a, b, c]
        .iter()
        .map(|s| PointHandle::from(graph.begin_point(*s).unwrap()))
        .collect();
    let merged = graph
        .merge_connections(&handles)
        .unwrap()
        .expect("neuer Punkt erwartet");

    let cp = graph.connection_point(merged).unwrap();
    assert_relative_eq!(cp.location().x, 1.0);
    assert_relative_eq!(cp.location().y, 2.0 / 3.0, epsilon = 1e-12);
    assert_eq!(cp.connection_count(), 3);
    assert_eq!(graph.point_count(), 4);
    for s in [a, b, c] {
        assert_eq!(graph.segment(s).unwrap().start_point(), Some(merged));
        assert_eq!(graph.segment(s).unwrap().first_point(), Some(cp.location()));
    }
}

#[test]
fn test_verschmelzen_randfaelle() {
    let mut graph = Graph::new();
    let a = graph.insert(seg(&[(0.0, 0.0), (10.0, 0.0)])).unwrap();
    let p = graph.segment(a).unwrap().start_point().unwrap();

    assert_eq!(graph.merge_connections(&[]), Ok(None));
    assert_eq!(graph.merge_connections(&[p.into()]), Ok(Some(p)));
    assert_eq!(graph.merge_connections(&[p.into(), p.into()]), Ok(Some(p)));
    assert_eq!(
        graph.merge_connections(&[PointId(u64::MAX).into()]),
        Err(GraphError::UnknownPoint(PointId(u64::MAX)))
    );
}

#[test]
fn test_verschmelzen_nimmt_fehlschlag_zurueck() {
    let mut graph = Graph::new();
    let a = graph.insert(seg(&[(0.0, 0.0), (10.0, 0.0)])).unwrap();
    let start = graph.segment(a).unwrap().start_point().unwrap();
    let end = graph.segment(a).unwrap().end_point().unwrap();

    // Beide Enden im selben Schwerpunkt: Winkel nicht definiert
    let result = graph.merge_connections(&[start.into(), end.into()]);
    assert!(matches!(result, Err(GraphError::DegenerateAngle { .. })));
    assert_eq!(graph.point_count(), 2);
    assert_eq!(graph.segment(a).unwrap().start_point(), Some(start));
    assert_eq!(graph.segment(a).unwrap().points(), &[DVec2::ZERO, DVec2::new(10.0, 0.0)]);
}

#[test]
fn test_verschmelzen_setzt_bereits_verschobene_enden_zurueck() {
    let mut graph = Graph::new();
    let a = graph.insert(seg(&[(0.0, 0.0), (10.0, 0.0)])).unwrap();
    let b = graph.insert(seg(&[(20.0, 0.0), (30.0, 0.0)])).unwrap();
    let a_start = graph.segment(a).unwrap().start_point().unwrap();
    let a_end = graph.segment(a).unwrap().end_point().unwrap();
    let b_start = graph.segment(b).unwrap().start_point().unwrap();
    assert_eq!(graph.point_count(), 4);

    // Schwerpunkt (10,0): das Ende von `a` hängt schon am neuen Punkt, bevor sein Start scheitert
    let result = graph.merge_connections(&[a_end.into(), a_start.into(), b_start.into()]);
    let Err(e) = result else {
        panic!("Fehler erwartet");
    };
    assert!(matches!(e, GraphError::DegenerateAngle { segment, .. } if segment == a));

    assert_eq!(graph.point_count(), 4);
    let seg_a = graph.segment(a).unwrap();
    assert_eq!(seg_a.points(), &[DVec2::ZERO, DVec2::new(10.0, 0.0)]);
    assert_eq!(seg_a.start_point(), Some(a_start));
    assert_eq!(seg_a.end_point(), Some(a_end));
    for p in [a_start, a_end, b_start] {
        assert_eq!(graph.connection_point(p).unwrap().connection_count(), 1);
    }
}

#[test]
fn test_unvollstaendige_ruecknahme_wird_gemeldet() {
    let cause = GraphError::NoSuchElement;
    assert_eq!(GraphError::after_rollback(cause.clone(), 0), cause);

    let e = GraphError::after_rollback(cause.clone(), 2);
    assert_eq!(
        e,
        GraphError::IncompleteRollback {
            cause: Box::new(cause),
            failed_steps: 2,
        }
    );
    assert!(e.to_string().contains("Rücknahme unvollständig"));
}

#[test]
fn test_segment_ende_umhaengen() {
    let mut graph = Graph::new();
    let a = graph.insert(seg(&[(0.0, 0.0), (10.0, 0.0)])).unwrap();
    let b = graph.insert(seg(&[(0.0, 5.0), (10.0, 5.0)])).unwrap();
    assert_eq!(graph.point_count(), 4);

    let target = graph.segment(a).unwrap().end_point().unwrap();
    let p = graph
        .connect_segment_end_point(Some(target.into()), b, None)
        .unwrap();
    assert_eq!(p, target);
    assert_eq!(graph.point_count(), 3);
    assert_eq!(graph.segment(b).unwrap().last_point(), Some(DVec2::new(10.0, 0.0)));

    let fresh = graph
        .connect_segment_start_point(None, b, Some(DVec2::new(0.0, 6.0)))
        .unwrap();
    assert_eq!(graph.point_count(), 3);
    assert_eq!(graph.segment(b).unwrap().first_point(), Some(DVec2::new(0.0, 6.0)));
    assert_eq!(graph.segment(b).unwrap().start_point(), Some(fresh));
}

#[test]
fn test_segmentkette_ueber_grad_zwei_punkte() {
    let mut graph = Graph::new();
    let s1 = graph.insert(seg(&[(0.0, 0.0), (10.0, 0.0)])).unwrap();
    let s2 = graph.insert(seg(&[(10.0, 0.0), (20.0, 0.0)])).unwrap();
    let s3 = graph.insert(seg(&[(30.0, 0.0), (20.0, 0.0)])).unwrap();
    // An (0,0) zweigen zwei weitere Segmente ab, dort endet die Kette
    graph.insert(seg(&[(0.0, 0.0), (0.0, 10.0)])).unwrap();
    graph.insert(seg(&[(0.0, 0.0), (0.0, -10.0)])).unwrap();

    let chain = graph.segment_chain(s2, true, true).unwrap();
    assert_eq!(chain.segments(), &[s1, s2, s3]);
    assert_relative_eq!(chain.length(), 30.0);
    assert_eq!(chain.starting_point(), graph.segment(s1).unwrap().start_point());
    assert_eq!(chain.ending_point(), graph.segment(s3).unwrap().start_point());

    let forward = graph.segment_chain(s2, true, false).unwrap();
    assert_eq!(forward.segments(), &[s2, s3]);
    assert!(graph.segment_chain(SegmentId(u64::MAX), true, true).is_err());
}

#[test]
fn test_segment_bearbeiten_sortiert_neu() {
    let (mut graph, [east, north, _, south]) = star();
    let p = center(&graph, east);

    // Ost knickt nach Norden ab: Winkel wandert hinter Nord
    graph
        .update_segment(east, |s| s.insert_point(1, DVec2::new(1.0, 5.0)))
        .unwrap();
    let cp = graph.connection_point(p).unwrap();
    let order: Vec<SegmentId> = cp.connections().iter().map(|c| c.segment).collect();
    assert_eq!(order.first(), Some(&south));
    assert_eq!(order.last(), Some(&east));
    assert!(order.contains(&north));

    let err = graph
        .update_segment(east, |s| s.set_point(1, DVec2::ZERO))
        .unwrap_err();
    assert!(matches!(err, GraphError::DegenerateAngle { .. }));
    assert_eq!(graph.segment(east).unwrap().points()[1], DVec2::new(1.0, 5.0));
    assert_eq!(graph.connection_point(p).unwrap().connection_count(), 4);
}

#[test]
fn test_ereignisse_fuer_einfuegen_aendern_entfernen() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut graph = Graph::new();
    let sink = Rc::clone(&seen);
    let listener = graph.subscribe(move |e| sink.borrow_mut().push(*e));

    let a = graph.insert(seg(&[(0.0, 0.0), (10.0, 0.0)])).unwrap();
    graph
        .update_segment(a, |s| s.set_road_name("Ringstraße"))
        .unwrap();
    graph.remove(a);
    assert!(graph.unsubscribe(listener));
    graph.insert(seg(&[(0.0, 0.0), (1.0, 0.0)])).unwrap();

    assert_eq!(
        *seen.borrow(),
        vec![
            GraphEvent::SegmentAdded(a),
            GraphEvent::SegmentChanged(a),
            GraphEvent::SegmentRemoved(a),
        ]
    );
}

#[test]
fn test_raeumliche_abfragen() {
    let (graph, [east, north, _, _]) = star();

    assert_eq!(graph.nearest_segment(DVec2::new(6.0, 1.0)), Some(east));
    assert_eq!(graph.nearest_segment(DVec2::new(1.0, 8.0)), Some(north));

    let tip = graph.segment(north).unwrap().end_point();
    assert_eq!(graph.nearest_connection(DVec2::new(0.5, 9.0)), tip);

    let rect = Rect::from_corners(DVec2::new(2.0, -1.0), DVec2::new(12.0, 1.0));
    assert_eq!(graph.segments_in(&rect), vec![east]);
    assert_eq!(
        graph.connections_in(&rect),
        vec![graph.segment(east).unwrap().end_point().unwrap()]
    );

    let bbox = graph.bounding_box().unwrap();
    assert_eq!(bbox.min, DVec2::new(-10.0, -10.0));
    assert_eq!(bbox.max, DVec2::new(10.0, 10.0));
}

#[test]
fn test_befahrbarkeit_folgt_verkehrsrichtung() {
    let mut graph = Graph::new();
    let a = graph.insert(seg(&[(0.0, 0.0), (10.0, 0.0)])).unwrap();
    let start = graph.segment(a).unwrap().start_point().unwrap();
    let end = graph.segment(a).unwrap().end_point().unwrap();

    assert!(graph.is_traversable_from(a, start));
    assert!(graph.is_traversable_from(a, end));

    graph
        .update_segment(a, |s| {
            s.set_traffic_direction(crate::core::TrafficDirection::OneWay)
        })
        .unwrap();
    assert!(graph.is_traversable_from(a, start));
    assert!(!graph.is_traversable_from(a, end));
    assert_eq!(graph.other_side_point(a, start), Some(end));
}

#[test]
fn test_clear_leert_den_graphen() {
    let (mut graph, _) = star();
    graph.clear();
    assert!(graph.is_empty());
    assert_eq!(graph.point_count(), 0);
    assert_eq!(graph.bounding_box(), None);
}
