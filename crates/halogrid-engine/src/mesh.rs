//! In-process channel mesh communicator.
//!
//! One worker thread per rank, connected by a full mesh of unbounded mpsc
//! channels: sends never block, each rank drains a single inbox. Packets are
//! matched by sender and kind; anything received out of order is parked in a
//! pending queue until someone asks for it. Collectives are message-based
//! through rank 0 (gather + broadcast), so a mesh round has the same shape
//! an MPI-backed communicator would have.

use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, Sender};

use halogrid_core::Direction;

use crate::error::{Error, Result};
use crate::transport::Communicator;

#[derive(Debug)]
enum Body {
    Halo {
        direction: Direction,
        round: u32,
        payload: Vec<f32>,
    },
    Flag(bool),
    Decision(bool),
    Time {
        seq: u64,
        value: f64,
    },
    Barrier,
    BarrierAck,
}

#[derive(Debug)]
struct Packet {
    from: usize,
    body: Body,
}

/// One rank's endpoint of the channel mesh.
pub struct ChannelMesh {
    rank: usize,
    senders: Vec<Sender<Packet>>,
    inbox: Receiver<Packet>,
    pending: VecDeque<Packet>,
    time_seq: u64,
}

impl ChannelMesh {
    /// Build the endpoints for a run of `size` ranks.
    pub fn build(size: usize) -> Vec<ChannelMesh> {
        assert!(size > 0);
        let mut senders = Vec::with_capacity(size);
        let mut inboxes = Vec::with_capacity(size);
        for _ in 0..size {
            let (tx, rx) = mpsc::channel();
            senders.push(tx);
            inboxes.push(rx);
        }
        inboxes
            .into_iter()
            .enumerate()
            .map(|(rank, inbox)| ChannelMesh {
                rank,
                senders: senders.clone(),
                inbox,
                pending: VecDeque::new(),
                time_seq: 0,
            })
            .collect()
    }

    fn post(&self, to: usize, body: Body) -> std::result::Result<(), ()> {
        self.senders[to]
            .send(Packet {
                from: self.rank,
                body,
            })
            .map_err(|_| ())
    }

    /// Pull the first packet matching `pred`, parking everything else.
    fn take(&mut self, pred: impl Fn(&Packet) -> bool) -> std::result::Result<Packet, ()> {
        if let Some(pos) = self.pending.iter().position(&pred) {
            return Ok(self.pending.remove(pos).unwrap_or_else(|| unreachable!()));
        }
        loop {
            let packet = self.inbox.recv().map_err(|_| ())?;
            if pred(&packet) {
                return Ok(packet);
            }
            self.pending.push_back(packet);
        }
    }
}

impl Communicator for ChannelMesh {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.senders.len()
    }

    fn send_halo(
        &mut self,
        to: usize,
        direction: Direction,
        round: u32,
        payload: Vec<f32>,
    ) -> Result<()> {
        self.post(
            to,
            Body::Halo {
                direction,
                round,
                payload,
            },
        )
        .map_err(|_| Error::Transfer {
            rank: self.rank,
            peer: to,
            direction,
        })
    }

    fn recv_halo(&mut self, from: usize, direction: Direction, round: u32) -> Result<Vec<f32>> {
        let packet = self
            .take(|p| p.from == from && matches!(p.body, Body::Halo { direction: d, .. } if d == direction))
            .map_err(|_| Error::Transfer {
                rank: self.rank,
                peer: from,
                direction,
            })?;
        match packet.body {
            Body::Halo {
                round: got,
                payload,
                ..
            } => {
                // Per-peer FIFO already orders rounds; the tag is a sanity net.
                debug_assert_eq!(got, round, "halo round mismatch from {from}");
                Ok(payload)
            }
            _ => unreachable!("take() matched a halo packet"),
        }
    }

    fn allreduce_or(&mut self, local: bool) -> Result<bool> {
        let fail = |rank| Error::Collective {
            rank,
            op: "allreduce_or",
        };
        if self.rank == 0 {
            let mut acc = local;
            for _ in 1..self.size() {
                let packet = self
                    .take(|p| matches!(p.body, Body::Flag(_)))
                    .map_err(|_| fail(0))?;
                if let Body::Flag(flag) = packet.body {
                    acc |= flag;
                }
            }
            for to in 1..self.size() {
                self.post(to, Body::Decision(acc)).map_err(|_| fail(0))?;
            }
            Ok(acc)
        } else {
            self.post(0, Body::Flag(local)).map_err(|_| fail(self.rank))?;
            let packet = self
                .take(|p| p.from == 0 && matches!(p.body, Body::Decision(_)))
                .map_err(|_| fail(self.rank))?;
            match packet.body {
                Body::Decision(acc) => Ok(acc),
                _ => unreachable!(),
            }
        }
    }

    fn reduce_max(&mut self, local: f64) -> Result<Option<f64>> {
        let fail = |rank| Error::Collective {
            rank,
            op: "reduce_max",
        };
        // Nothing flows back to the senders, so consecutive reductions are
        // only kept apart by the sequence number every endpoint advances in
        // lockstep.
        let seq = self.time_seq;
        self.time_seq += 1;
        if self.rank == 0 {
            let mut max = local;
            for _ in 1..self.size() {
                let packet = self
                    .take(|p| matches!(p.body, Body::Time { seq: s, .. } if s == seq))
                    .map_err(|_| fail(0))?;
                if let Body::Time { value, .. } = packet.body {
                    max = max.max(value);
                }
            }
            Ok(Some(max))
        } else {
            self.post(0, Body::Time { seq, value: local })
                .map_err(|_| fail(self.rank))?;
            Ok(None)
        }
    }

    fn barrier(&mut self) -> Result<()> {
        let fail = |rank| Error::Collective {
            rank,
            op: "barrier",
        };
        if self.rank == 0 {
            for _ in 1..self.size() {
                self.take(|p| matches!(p.body, Body::Barrier))
                    .map_err(|_| fail(0))?;
            }
            for to in 1..self.size() {
                self.post(to, Body::BarrierAck).map_err(|_| fail(0))?;
            }
        } else {
            self.post(0, Body::Barrier).map_err(|_| fail(self.rank))?;
            self.take(|p| p.from == 0 && matches!(p.body, Body::BarrierAck))
                .map_err(|_| fail(self.rank))?;
        }
        Ok(())
    }
}
