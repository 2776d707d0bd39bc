// Communication channels lock-free

use crate::audio::tone::ToneRequest;
use crate::messaging::notification::Notification;
use ringbuf::{HeapRb, traits::Split};

/// Scheduler → audio callback
pub type ToneProducer = ringbuf::HeapProd<ToneRequest>;
pub type ToneConsumer = ringbuf::HeapCons<ToneRequest>;

pub fn create_tone_channel(capacity: usize) -> (ToneProducer, ToneConsumer) {
    let rb = HeapRb::<ToneRequest>::new(capacity);
    rb.split()
}

/// Audio/catalog/schedule → UI status bar
pub type NotificationProducer = ringbuf::HeapProd<Notification>;
pub type NotificationConsumer = ringbuf::HeapCons<Notification>;

pub fn create_notification_channel(
    capacity: usize,
) -> (NotificationProducer, NotificationConsumer) {
    let rb = HeapRb::<Notification>::new(capacity);
    rb.split()
}
