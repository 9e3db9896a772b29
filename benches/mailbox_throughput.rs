// benches/mailbox_throughput.rs

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rcell::{ActorContext, ActorSystem, Behavior, Flow, Mailbox, Message, SystemConfig, SystemEvent};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

// --- Benchmarking Constants ---
const NUM_MESSAGES: usize = 10_000;
const RECV_TIMEOUT: Duration = Duration::from_secs(5);

// Single thread: enqueue then drain.
fn bench_send_receive(c: &mut Criterion) {
  let mut group = c.benchmark_group("mailbox_send_receive");
  group.throughput(Throughput::Elements(NUM_MESSAGES as u64));

  group.bench_function("same_thread", |b| {
    let mailbox: Mailbox<u64> = Mailbox::new();
    b.iter(|| {
      for i in 0..NUM_MESSAGES {
        mailbox.tell(i as u64);
      }
      for _ in 0..NUM_MESSAGES {
        black_box(mailbox.receive(None, None).unwrap());
      }
    });
  });

  // System events interleaved with regular traffic exercise the head insert.
  group.bench_function("with_system_events", |b| {
    let mailbox: Mailbox<u64> = Mailbox::new();
    b.iter(|| {
      for i in 0..NUM_MESSAGES {
        if i % 100 == 0 {
          mailbox.send(Message::System(SystemEvent::Signal { name: "tick".into() }));
        } else {
          mailbox.tell(i as u64);
        }
      }
      for _ in 0..NUM_MESSAGES {
        black_box(mailbox.receive(None, None).unwrap());
      }
    });
  });
  group.finish();
}

// N producer threads, one consumer.
fn bench_contended(c: &mut Criterion) {
  let mut group = c.benchmark_group("mailbox_contended");
  group.throughput(Throughput::Elements(NUM_MESSAGES as u64));

  for producers in [1usize, 2, 4, 8] {
    group.bench_with_input(BenchmarkId::from_parameter(producers), &producers, |b, &producers| {
      b.iter(|| {
        let mailbox: Mailbox<u64> = Mailbox::new();
        let per_producer = NUM_MESSAGES / producers;
        let handles: Vec<_> = (0..producers)
          .map(|_| {
            let mailbox = mailbox.clone();
            thread::spawn(move || {
              for i in 0..per_producer {
                mailbox.tell(i as u64);
              }
            })
          })
          .collect();
        for _ in 0..(per_producer * producers) {
          black_box(mailbox.receive(Some(RECV_TIMEOUT), None).unwrap());
        }
        for handle in handles {
          handle.join().unwrap();
        }
      });
    });
  }
  group.finish();
}

struct Sink {
  received: Arc<AtomicUsize>,
}

impl Behavior for Sink {
  type Payload = u64;

  fn handle(&mut self, _payload: u64, _ctx: &ActorContext<u64>) -> Flow {
    self.received.fetch_add(1, Ordering::Relaxed);
    Flow::Continue
  }
}

// Full actor path: tell into a running actor and wait for it to drain.
fn bench_actor_tell(c: &mut Criterion) {
  let mut group = c.benchmark_group("actor_tell");
  group.throughput(Throughput::Elements(NUM_MESSAGES as u64));

  let system = ActorSystem::new(SystemConfig::default().with_shutdown_timeout(Duration::from_secs(2)));
  let received = Arc::new(AtomicUsize::new(0));
  let actor = system
    .spawn_actor(Some("sink"), Sink { received: received.clone() })
    .expect("spawn sink");

  group.bench_function("sink", |b| {
    b.iter(|| {
      let target = received.load(Ordering::Relaxed) + NUM_MESSAGES;
      for i in 0..NUM_MESSAGES {
        actor.tell(i as u64);
      }
      while received.load(Ordering::Relaxed) < target {
        std::hint::spin_loop();
      }
    });
  });
  group.finish();

  system.shutdown();
}

criterion_group!(benches, bench_send_receive, bench_contended, bench_actor_tell);
criterion_main!(benches);
