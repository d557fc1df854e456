//! End-to-end tests: bytes in, records and events out

use chrono::NaiveDate;
use gps_engine::{
    EchoBuffer, EngineConfig, EventKind, FixQuality, GpsEngine, Geodetic, PpsEdge, SentenceKind,
    TimeStatus,
};
use nmea_protocol::MockReceiver;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

const GGA: &str = "$GPGGA,112709.00,5611.5340,N,00302.0306,W,1,08,1.0,545.4,M,,,,*47\r\n";
const RMC: &str = "$GPRMC,112709.735,A,5611.5340,N,00302.0306,W,000.0,307.0,150411,,,A*70\r\n";
const VTG: &str = "$GPVTG,054.7,T,034.4,M,005.5,N,010.2,K*48\r\n";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}

fn engine() -> GpsEngine {
    init_tracing();
    GpsEngine::new(EngineConfig::default()).unwrap()
}

/// Per-event call counters registered on an engine
struct EventCounts {
    counts: Vec<(EventKind, Arc<AtomicUsize>)>,
}

impl EventCounts {
    fn register(engine: &mut GpsEngine) -> Self {
        let counts = EventKind::ALL
            .iter()
            .map(|&kind| {
                let count = Arc::new(AtomicUsize::new(0));
                let hits = Arc::clone(&count);
                engine.set_handler(kind, move || {
                    hits.fetch_add(1, Ordering::SeqCst);
                });
                (kind, count)
            })
            .collect();
        Self { counts }
    }

    fn get(&self, kind: EventKind) -> usize {
        self.counts
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, count)| count.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    fn total(&self) -> usize {
        self.counts.iter().map(|(_, c)| c.load(Ordering::SeqCst)).sum()
    }
}

/// Feed one sentence byte by byte through the interrupt handle
fn deliver(engine: &GpsEngine, sentence: &str) {
    let ingestor = engine.ingestor();
    let mut completed = 0;
    for byte in sentence.bytes() {
        if ingestor.on_byte(byte) {
            completed += 1;
        }
    }
    assert_eq!(completed, 1, "sentence must end with a single terminator");
}

#[test]
fn test_gga_fires_only_fix_handler_once() {
    let mut engine = engine();
    let events = EventCounts::register(&mut engine);

    deliver(&engine, GGA);
    assert_eq!(events.total(), 0);
    assert_eq!(engine.on_tick(), Some(SentenceKind::Gga));
    assert_eq!(engine.on_tick(), None);

    assert_eq!(events.get(EventKind::Fix), 1);
    assert_eq!(events.total(), 1);
}

#[test]
fn test_gga_reference_values() {
    let mut engine = engine();
    let reader = engine.reader();
    deliver(&engine, GGA);
    engine.on_tick();

    assert!((reader.latitude() - 56.1922).abs() < 1e-4);
    assert!((reader.longitude() + 3.0338).abs() < 1e-4);
    assert!((reader.altitude() - 0.5454).abs() < 1e-9);
    assert_eq!(reader.satellites(), 8);
    assert_eq!(reader.gps_quality(), FixQuality::Gps);
}

#[test]
fn test_rmc_reference_values() {
    let mut engine = engine();
    let events = EventCounts::register(&mut engine);
    let reader = engine.reader();

    deliver(&engine, RMC);
    assert_eq!(engine.on_tick(), Some(SentenceKind::Rmc));

    let time = reader.time();
    assert_eq!((time.year, time.month, time.day), (2011, 4, 15));
    assert_eq!((time.hour, time.minute, time.second), (11, 27, 9));
    assert_eq!((time.deciseconds, time.centiseconds), (0, 0));
    assert_eq!(time.status, TimeStatus::Valid);
    assert!(reader.is_time_valid());
    assert_eq!(time.track(), 307.0);
    assert_eq!(events.get(EventKind::Time), 1);
    assert_eq!(events.total(), 1);
}

#[test]
fn test_vtg_updates_vector() {
    let mut engine = engine();
    let reader = engine.reader();
    deliver(&engine, VTG);
    assert_eq!(engine.on_tick(), Some(SentenceKind::Vtg));

    let vector = reader.vector();
    assert_eq!(vector.track_true, 54.7);
    assert_eq!(vector.track_magnetic, 34.4);
    assert_eq!(vector.speed_knots, 5.5);
    assert_eq!(vector.speed_kph, 10.2);

    deliver(&engine, "$GPVTG,100.0,T\r\n");
    engine.on_tick();
    let vector = reader.vector();
    assert_eq!(vector.track_true, 100.0);
    assert_eq!(vector.speed_kph, 10.2);
}

#[test]
fn test_quality_zero_keeps_last_position() {
    let mut engine = engine();
    let reader = engine.reader();
    deliver(&engine, GGA);
    engine.on_tick();
    let before = reader.position();

    deliver(&engine, "$GPGGA,112710.00,3352.1280,S,15112.3450,E,0,00,99.9,12.0,M,,,,\r\n");
    engine.on_tick();

    let after = reader.position();
    assert_eq!(after.quality, 0);
    assert!(!after.has_fix());
    assert_eq!(after.latitude, before.latitude);
    assert_eq!(after.longitude, before.longitude);
    assert_eq!(after.altitude_km, before.altitude_km);
}

#[test]
fn test_truncated_gga_forces_no_fix() {
    let mut engine = engine();
    let events = EventCounts::register(&mut engine);
    let reader = engine.reader();
    deliver(&engine, GGA);
    engine.on_tick();

    deliver(&engine, "$GPGGA,112710.00,5611.5340,N\r\n");
    assert_eq!(engine.on_tick(), Some(SentenceKind::Gga));

    assert_eq!(reader.gps_quality(), FixQuality::Invalid);
    assert!((reader.latitude() - 56.1922).abs() < 1e-4);
    assert_eq!(events.get(EventKind::Fix), 2);
    assert_eq!(reader.diagnostics().dropped_sentences, 1);
}

#[test]
fn test_echo_receives_verbatim_line() {
    let mut engine = engine();
    let position_echo = EchoBuffer::new();
    let time_echo = EchoBuffer::new();
    assert!(engine
        .set_echo(SentenceKind::Gga, position_echo.clone())
        .is_none());
    engine.set_echo(SentenceKind::Rmc, time_echo.clone());

    deliver(&engine, GGA);
    engine.on_tick();

    // Adjacent separators arrive with the synthetic zero already in place
    assert_eq!(
        position_echo.contents(),
        "$GPGGA,112709.00,5611.5340,N,00302.0306,W,1,08,1.0,545.4,M,0,0,0,*47\r\n"
    );
    assert!(time_echo.is_empty());

    assert!(engine.clear_echo(SentenceKind::Gga).is_some());
    deliver(&engine, "$GPGGA,1\r\n");
    engine.on_tick();
    assert!(position_echo.contents().starts_with("$GPGGA,112709.00"));
}

#[test]
fn test_unknown_sentence_fires_unknown_only() {
    let mut engine = engine();
    let events = EventCounts::register(&mut engine);
    let unknown_echo = EchoBuffer::new();
    engine.set_echo(SentenceKind::Unknown, unknown_echo.clone());
    let reader = engine.reader();

    deliver(&engine, "$GPGSA,A,3,04,05,,09,12,,,24,,,,,2.5,1.3,2.1*39\r\n");
    assert_eq!(engine.on_tick(), Some(SentenceKind::Unknown));

    assert_eq!(events.get(EventKind::Unknown), 1);
    assert_eq!(events.total(), 1);
    assert!(unknown_echo.contents().starts_with("$GPGSA,A,3,04,05,0,09"));
    assert_eq!(reader.position(), Geodetic::default());
    assert_eq!(reader.diagnostics().unknown_sentences, 1);
}

#[test]
fn test_cleared_handler_is_not_called() {
    let mut engine = engine();
    let events = EventCounts::register(&mut engine);
    assert!(engine.has_handler(EventKind::Fix));
    assert!(engine.clear_handler(EventKind::Fix));
    assert!(!engine.clear_handler(EventKind::Fix));
    assert!(!engine.has_handler(EventKind::Fix));

    deliver(&engine, GGA);
    engine.on_tick();
    assert_eq!(events.total(), 0);
    assert_eq!(engine.reader().satellites(), 8);
}

#[test]
fn test_tick_advances_sub_second_without_carry() {
    let mut engine = GpsEngine::new(EngineConfig {
        tick_interval_ms: 20,
        ..Default::default()
    })
    .unwrap();
    let reader = engine.reader();

    for _ in 0..49 {
        engine.on_tick();
    }
    let time = reader.time();
    assert_eq!((time.deciseconds, time.centiseconds), (9, 8));

    engine.on_tick();
    let time = reader.time();
    assert_eq!((time.second, time.deciseconds, time.centiseconds), (0, 0, 0));
}

#[test]
fn test_pulse_rolls_over_new_year() {
    let mut engine = engine();
    let events = EventCounts::register(&mut engine);
    let reader = engine.reader();
    let pulse = engine.pulse_input();

    assert!(!pulse.on_pulse());
    engine.attach_pulse(PpsEdge::Rising);

    deliver(
        &engine,
        "$GPRMC,235959.00,A,5611.5340,N,00302.0306,W,000.0,307.0,311223,,,A\r\n",
    );
    engine.on_tick();
    for _ in 0..98 {
        engine.on_tick();
    }
    let time = reader.time();
    assert_eq!((time.hour, time.minute, time.second), (23, 59, 59));
    assert_eq!((time.deciseconds, time.centiseconds), (9, 9));

    assert!(pulse.on_edge(PpsEdge::Rising));
    assert!(!pulse.on_edge(PpsEdge::Falling));
    engine.on_tick();

    let time = reader.time();
    assert_eq!((time.year, time.month, time.day), (2024, 1, 1));
    assert_eq!((time.hour, time.minute, time.second), (0, 0, 0));
    assert_eq!((time.deciseconds, time.centiseconds), (0, 0));
    assert_eq!(events.get(EventKind::Pulse), 1);
    assert_eq!(events.get(EventKind::ClockSync), 1);
    assert_eq!(reader.diagnostics().pulses_applied, 1);

    engine.on_tick();
    assert_eq!(events.get(EventKind::ClockSync), 1);

    engine.detach_pulse();
    assert!(!engine.is_pulse_attached());
    assert!(!pulse.on_pulse());
}

#[test]
fn test_clock_sync_once_per_minute() {
    let mut engine = engine();
    let events = EventCounts::register(&mut engine);
    let minute = "$GPRMC,112800.00,A,5611.5340,N,00302.0306,W,000.0,307.0,150411,,,A\r\n";

    deliver(&engine, minute);
    engine.on_tick();
    assert_eq!(events.get(EventKind::ClockSync), 1);

    deliver(&engine, minute);
    engine.on_tick();
    assert_eq!(events.get(EventKind::ClockSync), 1);

    deliver(
        &engine,
        "$GPRMC,112900.00,A,5611.5340,N,00302.0306,W,000.0,307.0,150411,,,A\r\n",
    );
    engine.on_tick();
    assert_eq!(events.get(EventKind::ClockSync), 2);
}

#[test]
fn test_void_time_never_syncs_clock() {
    let mut engine = engine();
    let events = EventCounts::register(&mut engine);
    let reader = engine.reader();

    deliver(&engine, "$GPRMC,113000.00,V,,,,,,,150411,,,N\r\n");
    engine.on_tick();

    assert!(!reader.is_time_valid());
    assert_eq!(reader.time().minute, 30);
    assert_eq!(events.get(EventKind::Time), 1);
    assert_eq!(events.get(EventKind::ClockSync), 0);
}

#[test]
fn test_overflow_wraps_and_recovers() {
    init_tracing();
    let mut engine = GpsEngine::new(EngineConfig {
        line_capacity: 16,
        ..Default::default()
    })
    .unwrap();
    let reader = engine.reader();

    deliver(&engine, "$GPGGA,0123456789,0123456789,0123456789\r\n");
    engine.on_tick();
    assert!(reader.diagnostics().overflow_wraps >= 1);

    deliver(&engine, "$GPVTG,1,T,2,M\n");
    assert_eq!(engine.on_tick(), Some(SentenceKind::Vtg));
    assert_eq!(reader.vector().track_magnetic, 2.0);
}

#[test]
fn test_simulated_receiver_session() {
    let mut engine = engine();
    let reader = engine.reader();
    let start = NaiveDate::from_ymd_opt(2024, 2, 29)
        .unwrap()
        .and_hms_opt(23, 59, 58)
        .unwrap();
    let mut receiver = MockReceiver::new(start)
        .with_position(-33.8688, 151.2093, 58.0)
        .with_velocity(12.0, 90.0);

    for _ in 0..3 {
        for line in receiver.epoch().split_inclusive('\n') {
            assert_eq!(engine.feed(line.as_bytes()), 1);
            assert!(engine.on_tick().is_some());
        }
        receiver.advance();
    }

    let time = reader.time();
    assert_eq!((time.year, time.month, time.day), (2024, 3, 1));
    assert_eq!((time.hour, time.minute, time.second), (0, 0, 0));
    assert!((reader.latitude() + 33.8688).abs() < 1e-4);
    assert!((reader.longitude() - 151.2093).abs() < 1e-4);
    assert!((reader.vector().speed_knots - 12.0).abs() < 1e-9);
    assert!((reader.time().speed_knots() - 12.0).abs() < 1e-9);

    let diagnostics = reader.diagnostics();
    assert_eq!(diagnostics.fix_sentences, 3);
    assert_eq!(diagnostics.time_sentences, 3);
    assert_eq!(diagnostics.vector_sentences, 3);
    assert_eq!(diagnostics.dropped_sentences, 0);
    assert_eq!(diagnostics.lines_completed, 9);

    let lst = reader.sidereal_degrees();
    assert!((0.0..360.0).contains(&lst));
    assert!((reader.sidereal_hour_angle() - lst / 15.0).abs() < 1e-9);
    assert_eq!(reader.julian_day_number(), 2_460_371);
}

#[test]
fn test_concurrent_reads_never_tear() {
    let mut engine = engine();
    let reader = engine.reader();
    let first = "$GPGGA,000001.00,1000.0000,N,02000.0000,E,1,05,1.0,100.0,M,,,,\r\n";
    let second = "$GPGGA,000002.00,4000.0000,S,05000.0000,W,2,09,1.0,900.0,M,,,,\r\n";
    deliver(&engine, first);
    engine.on_tick();

    let done = Arc::new(AtomicBool::new(false));
    let watcher = {
        let done = Arc::clone(&done);
        let reader = reader.clone();
        std::thread::spawn(move || {
            let mut reads = 0u64;
            while !done.load(Ordering::Relaxed) {
                let place = reader.position();
                let north = (place.latitude, place.longitude, place.satellites, place.quality)
                    == (10.0, 20.0, 5, 1);
                let south = (place.latitude, place.longitude, place.satellites, place.quality)
                    == (-40.0, -50.0, 9, 2);
                assert!(north || south, "torn read: {place:?}");
                reads += 1;
            }
            reads
        })
    };

    for round in 0..2000 {
        deliver(&engine, if round % 2 == 0 { second } else { first });
        engine.on_tick();
    }
    done.store(true, Ordering::Relaxed);

    assert!(watcher.join().unwrap() > 0);
}

#[tokio::test(start_paused = true)]
async fn test_run_ticks_until_shutdown() {
    let mut engine = engine();
    let reader = engine.reader();
    let ingestor = engine.ingestor();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    ingestor.feed(RMC.as_bytes());
    let task = tokio::spawn(async move {
        engine.run(shutdown_rx).await;
        engine
    });

    tokio::time::sleep(Duration::from_millis(105)).await;
    let time = reader.time();
    assert_eq!((time.hour, time.minute, time.second), (11, 27, 9));
    assert!(time.deciseconds * 10 + time.centiseconds >= 9);

    shutdown_tx.send(true).unwrap();
    let engine = task.await.unwrap();
    assert_eq!(engine.reader().diagnostics().time_sentences, 1);
}

#[tokio::test(start_paused = true)]
async fn test_run_stops_when_sender_dropped() {
    let mut engine = engine();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    drop(shutdown_tx);
    tokio::time::timeout(Duration::from_secs(1), engine.run(shutdown_rx))
        .await
        .unwrap();
}

#[test]
fn test_invalid_config_is_rejected() {
    let result = GpsEngine::new(EngineConfig {
        tick_interval_ms: 7,
        ..Default::default()
    });
    assert!(result.is_err());
}

#[test]
fn test_configured_pulse_edge() {
    init_tracing();
    let mut engine = GpsEngine::new(EngineConfig {
        pps_edge: PpsEdge::Falling,
        ..Default::default()
    })
    .unwrap();
    let pulse = engine.pulse_input();
    assert_eq!(engine.config().pps_edge, PpsEdge::Falling);
    assert!(!engine.is_pulse_attached());

    engine.attach_configured_pulse();
    assert!(engine.is_pulse_attached());
    assert!(!pulse.on_edge(PpsEdge::Rising));
    assert!(pulse.on_edge(PpsEdge::Falling));

    engine.attach_pulse(PpsEdge::Rising);
    assert_eq!(engine.config().pps_edge, PpsEdge::Rising);
    assert!(pulse.on_edge(PpsEdge::Rising));

    engine.on_tick();
    assert_eq!(engine.reader().diagnostics().pulses_applied, 2);
}
