use cryotherm_core::buffer::RollingBuffer;
use cryotherm_core::monitor::{Sample, SampleBuffer};
use pretty_assertions::assert_eq;

#[test]
fn test_push_past_capacity_keeps_newest() {
    let mut buf = RollingBuffer::new(50, 0);
    for v in 1..=51 {
        buf.push(v);
    }
    assert_eq!(buf.len(), 50);
    assert_eq!(buf.to_vec(), (2..=51).collect::<Vec<_>>());
}

#[test]
fn test_shrink_keeps_tail() {
    let mut buf: RollingBuffer<i32> = (0..10).collect();
    buf.resize(5, -1);
    assert_eq!(buf.to_vec(), vec![5, 6, 7, 8, 9]);
}

#[test]
fn test_grow_pads_head() {
    let mut buf: RollingBuffer<i32> = (0..10).collect();
    buf.resize(5, -1);
    buf.resize(8, -1);
    assert_eq!(buf.to_vec(), vec![-1, -1, -1, 5, 6, 7, 8, 9]);
    assert_eq!(buf.last(), Some(&9));
}

#[test]
fn test_iteration_order() {
    let mut buf = RollingBuffer::new(3, None);
    buf.push(Some(1.0));
    let collected: Vec<_> = buf.iter().copied().collect();
    assert_eq!(collected, vec![None, None, Some(1.0)]);
    assert_eq!(buf.get(2), Some(&Some(1.0)));
    assert_eq!((&buf).into_iter().count(), 3);
}

#[test]
fn test_sample_buffer_sequences_stay_aligned() {
    let mut buf = SampleBuffer::new(3);
    for i in 0..5 {
        buf.push(Sample {
            time: f64::from(i),
            resistance: 10.0 * f64::from(i),
            temperature: 100.0 * f64::from(i),
        });
    }
    buf.resize(4);
    assert_eq!(buf.times().to_vec(), vec![None, Some(2.0), Some(3.0), Some(4.0)]);
    assert_eq!(buf.resistances().to_vec(), vec![None, Some(20.0), Some(30.0), Some(40.0)]);
    assert_eq!(buf.temperatures().to_vec(), vec![None, Some(200.0), Some(300.0), Some(400.0)]);
    assert_eq!(buf.filled(), 3);
}
