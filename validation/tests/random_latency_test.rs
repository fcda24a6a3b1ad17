use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use wavedma_core::core::BusRequest;
use wavedma_core::device::{ConfigWord, PlayerState, SampleRam, WavePlayer};
use wavedma_validation::{
    TracingBus, TracingRam, check_protocol, clock, record_playback, reference_samples,
    reset_pulse,
};

fn random_ram(rng: &mut StdRng) -> Vec<u8> {
    let mut bytes = vec![0u8; 1024];
    rng.fill(&mut bytes[..]);
    bytes
}

fn traced_ram(latency: u32, bytes: &[u8]) -> TracingRam {
    let mut ram = SampleRam::new(latency);
    ram.load_bytes(bytes);
    TracingBus::new(ram)
}

#[test]
fn test_latency_sweep_matches_reference() {
    let mut rng = StdRng::seed_from_u64(7);
    let bytes = random_ram(&mut rng);
    for period in [1u16, 2, 3, 8] {
        for latency in 0..=4 * u32::from(period) + 6 {
            for max_address in [1u8, 2, 5] {
                let count = usize::from(max_address) * 12;
                let mut bus = traced_ram(latency, &bytes);
                let recording = record_playback(
                    &mut bus,
                    ConfigWord::new(period, max_address, true),
                    count,
                    100_000,
                );
                let expected = reference_samples(&bytes, period, max_address, latency, count);
                assert_eq!(
                    recording.samples, expected,
                    "period {period}, latency {latency}, max_address {max_address}"
                );
                assert_eq!(check_protocol(&recording.trace, max_address), Ok(()));
                assert_eq!(
                    recording.stall_cycles > 0,
                    latency >= 4 * u32::from(period),
                    "period {period}, latency {latency}"
                );
            }
        }
    }
}

#[test]
fn test_zero_bound_never_touches_memory() {
    let mut bus = traced_ram(0, &[1, 2, 3, 4]);
    let recording = record_playback(&mut bus, ConfigWord::new(4, 0, true), 1, 500);
    assert!(recording.samples.is_empty());
    assert!(recording.trace.iter().all(|c| c.addr.is_none()));
}

/// Random host writes at random edges: the port contract must hold through
/// every arm, stop, retarget and period change.
#[test]
fn test_config_churn_keeps_protocol() {
    let mut rng = StdRng::seed_from_u64(0xC0FFEE);
    for round in 0..40 {
        let latency = rng.gen_range(0..=40);
        let bytes = random_ram(&mut rng);
        let mut bus = traced_ram(latency, &bytes);
        let mut player = WavePlayer::new();
        reset_pulse(&mut player, &mut bus);
        bus.clear_cycles();

        let mut widest = 1u8;
        for _ in 0..60 {
            let word = ConfigWord::new(
                rng.gen_range(0..=12),
                rng.gen_range(0..=20),
                rng.gen_bool(0.8),
            );
            widest = widest.max(word.max_address);
            let (_, ack) = clock(&mut player, &mut bus, Some(BusRequest::write(0, word.to_bits())));
            assert!(ack.is_some());
            for _ in 0..rng.gen_range(0..200) {
                clock(&mut player, &mut bus, None);
                if player.state() == PlayerState::Running {
                    let bound = player.active_config().max_address;
                    assert!(player.snapshot().current_address < bound);
                }
            }
        }
        if let Err(e) = check_protocol(&bus.cycles, widest) {
            panic!("round {round} (latency {latency}): {e}");
        }
    }
}

/// After any amount of churn, a stop followed by a fresh start plays the
/// table from word 0 in order.
#[test]
fn test_rearm_after_churn_restarts_table() {
    let mut rng = StdRng::seed_from_u64(99);
    for _ in 0..20 {
        let latency = rng.gen_range(0..=12);
        let bytes = random_ram(&mut rng);
        let mut bus = traced_ram(latency, &bytes);
        let mut player = WavePlayer::new();
        reset_pulse(&mut player, &mut bus);

        for _ in 0..10 {
            let word = ConfigWord::new(rng.gen_range(1..=6), rng.gen_range(1..=8), true);
            clock(&mut player, &mut bus, Some(BusRequest::write(0, word.to_bits())));
            for _ in 0..rng.gen_range(0..60) {
                clock(&mut player, &mut bus, None);
            }
        }

        let max_address = rng.gen_range(1..=6u8);
        let stop = ConfigWord::new(3, max_address, false);
        clock(&mut player, &mut bus, Some(BusRequest::write(0, stop.to_bits())));
        clock(&mut player, &mut bus, None);
        let start = ConfigWord { run: true, ..stop };
        clock(&mut player, &mut bus, Some(BusRequest::write(0, start.to_bits())));

        let count = usize::from(max_address) * 8;
        let mut codes = Vec::with_capacity(count);
        while codes.len() < count {
            if clock(&mut player, &mut bus, None).0 {
                codes.push(player.dac());
            }
        }
        let expected: Vec<u8> = bytes[..usize::from(max_address) * 4]
            .iter()
            .copied()
            .cycle()
            .take(count)
            .collect();
        assert_eq!(codes, expected);
    }
}
