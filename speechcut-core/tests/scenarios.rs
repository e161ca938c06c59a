use approx::assert_relative_eq;
use rand::{rngs::StdRng, Rng, SeedableRng};
use speechcut_core::{
    ChunkNormalizer, Segment, SegmentSplitter, SegmentationConfig, Segmenter, SilenceDetector,
    SpeechcutError, Waveform,
};

const RATE: u32 = 16_000;

fn tone(ms: u64, amplitude: f32) -> Vec<f32> {
    let n = (ms * u64::from(RATE) / 1000) as usize;
    (0..n)
        .map(|i| if i % 2 == 0 { amplitude } else { -amplitude })
        .collect()
}

fn silence(ms: u64) -> Vec<f32> {
    vec![0.0; (ms * u64::from(RATE) / 1000) as usize]
}

fn random_speech(seed: u64) -> Waveform {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut samples = Vec::new();
    for _ in 0..rng.gen_range(4..14) {
        let amp = rng.gen_range(0.2f32..0.8);
        samples.extend(tone(rng.gen_range(100..6_000), amp));
        samples.extend(silence(rng.gen_range(50..1_500)));
    }
    Waveform::new(samples, RATE)
}

#[test]
fn bursts_between_long_silences() {
    let mut samples = tone(100, 0.5);
    for _ in 0..10 {
        samples.extend(silence(2_000));
        samples.extend(tone(100, 0.5));
    }
    let wf = Waveform::new(samples, RATE);

    let silences = SilenceDetector::new(450, 14.0).detect(&wf).unwrap();
    assert_eq!(silences.len(), 10);

    let segments = SegmentSplitter::new(120).split(&wf, &silences);
    assert_eq!(segments.len(), 11);
    assert_eq!(segments[0], Segment::new(0, 220));
    assert_eq!(segments[1], Segment::new(1_980, 2_320));
    assert_eq!(segments[10], Segment::new(20_880, 21_100));

    let plan = Segmenter::new(SegmentationConfig::default())
        .unwrap()
        .plan(&wf)
        .unwrap();
    let durations: Vec<u64> = plan.chunks().iter().map(|c| c.duration_ms).collect();
    assert_eq!(durations, vec![3_280, 220]);
    assert_eq!(plan.chunks()[0].segments, 0..10);
}

#[test]
fn short_segments_merge_to_three_and_a_half_seconds() {
    let segments = vec![
        Segment::new(0, 1_000),
        Segment::new(1_500, 2_500),
        Segment::new(3_000, 4_500),
    ];
    let chunks = ChunkNormalizer::new(3.0, 8.0).unwrap().normalize(&segments);
    assert_eq!(chunks.len(), 1);
    assert_relative_eq!(chunks[0].duration_secs(), 3.5);
}

#[test]
fn long_chunk_splits_eight_eight_one_and_a_half() {
    let chunks = ChunkNormalizer::new(3.0, 8.0)
        .unwrap()
        .normalize(&[Segment::new(0, 17_500)]);
    let secs: Vec<f64> = chunks.iter().map(|c| c.duration_secs()).collect();
    assert_eq!(secs, vec![8.0, 8.0, 1.5]);
}

#[test]
fn inverted_chunk_bounds_rejected() {
    let cfg = SegmentationConfig {
        min_chunk_s: 5.0,
        max_chunk_s: 3.0,
        ..Default::default()
    };
    let err = Segmenter::new(cfg).unwrap_err();
    assert!(matches!(err, SpeechcutError::InvalidConfig(_)));
}

#[test]
fn empty_waveform_rejected() {
    let seg = Segmenter::new(SegmentationConfig::default()).unwrap();
    let err = seg.plan(&Waveform::new(Vec::new(), RATE)).unwrap_err();
    assert!(matches!(err, SpeechcutError::EmptyInput));
}

#[test]
fn level_drop_of_twenty_db_splits_the_recording() {
    let mut samples = tone(3_000, 0.5);
    samples.extend(tone(2_000, 0.05));
    samples.extend(tone(3_000, 0.5));
    let wf = Waveform::new(samples, RATE);

    let plan = Segmenter::new(SegmentationConfig::default())
        .unwrap()
        .plan(&wf)
        .unwrap();
    assert_eq!(plan.silences().len(), 1);
    assert_eq!(plan.segments().len(), 2);
    assert_eq!(plan.segments()[0].start_ms, 0);
    assert!(plan.segments()[0].end_ms <= 3_120);
    assert!(plan.segments()[1].start_ms >= 4_880);
    assert_eq!(plan.segments()[1].end_ms, 8_000);
    assert_eq!(plan.chunks().len(), 2);
}

#[test]
fn silence_intervals_are_ordered_for_varied_inputs() {
    let det = SilenceDetector::default();
    for seed in 1..=12 {
        let wf = random_speech(seed);
        let found = det.detect(&wf).unwrap();
        for iv in &found {
            assert!(iv.end_ms > iv.start_ms, "seed {seed}: {iv:?}");
            assert!(iv.end_ms <= wf.duration_ms());
        }
        for pair in found.windows(2) {
            assert!(pair[0].end_ms < pair[1].start_ms, "seed {seed}: {pair:?}");
        }
    }
}

#[test]
fn chunks_respect_bounds_for_varied_inputs() {
    let cfg = SegmentationConfig::default();
    let segmenter = Segmenter::new(cfg.clone()).unwrap();
    let max_ms = (cfg.max_chunk_s * 1000.0) as u64;
    let min_ms = (cfg.min_chunk_s * 1000.0) as u64;

    for seed in 1..=12 {
        let wf = random_speech(seed);
        let plan = segmenter.plan(&wf).unwrap();
        let chunks = plan.chunks();

        for (i, chunk) in chunks.iter().enumerate() {
            assert!(chunk.duration_ms > 0, "seed {seed}: empty chunk {chunk:?}");
            assert!(chunk.duration_ms <= max_ms, "seed {seed}: {chunk:?}");
            let trailing = i + 1 == chunks.len();
            if !trailing && !chunk.is_piece() {
                assert!(chunk.duration_ms >= min_ms, "seed {seed}: {chunk:?}");
            }
        }

        // Segments are consumed in order, each exactly once; pieces of one
        // split chunk share its range.
        let mut prev: Option<std::ops::Range<usize>> = None;
        for chunk in chunks {
            match &prev {
                Some(range) if *range == chunk.segments => assert!(chunk.is_piece()),
                Some(range) => assert_eq!(chunk.segments.start, range.end, "seed {seed}"),
                None => assert_eq!(chunk.segments.start, 0, "seed {seed}"),
            }
            prev = Some(chunk.segments.clone());
        }
        assert_eq!(
            prev.map(|r| r.end).unwrap_or(0),
            plan.segments().len(),
            "seed {seed}"
        );
        assert_eq!(
            plan.total_chunk_ms(),
            plan.segments().iter().map(|s| s.duration_ms()).sum::<u64>()
        );
    }
}

#[test]
fn split_pieces_rebuild_their_source_chunk() {
    let norm = ChunkNormalizer::new(3.0, 8.0).unwrap();
    for seed in 1..=6 {
        let wf = random_speech(seed);
        let silences = SilenceDetector::default().detect(&wf).unwrap();
        let segments = SegmentSplitter::new(120).split(&wf, &silences);
        let merged = norm.merge_forward(&segments);
        let pieces = norm.split_oversized(merged.clone());
        let plan = speechcut_core::ChunkPlan::new(silences, segments, pieces);

        for whole in &merged {
            let expected = plan.materialize(&wf, whole);
            let rebuilt: Vec<f32> = plan
                .chunks()
                .iter()
                .filter(|c| c.segments == whole.segments)
                .flat_map(|c| plan.materialize(&wf, c))
                .collect();
            assert_eq!(rebuilt.len(), expected.len(), "seed {seed}");
            assert!(rebuilt == expected, "seed {seed}: audio differs");
        }
    }
}
