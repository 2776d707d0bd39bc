// Messaging - lock-free queues between the UI thread, the audio callback
// and background workers

pub mod channels;
pub mod notification;
