//! Stabilization run daemons to maintain dht.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::channel::oneshot;
use futures::future::FutureExt;
use futures::pin_mut;
use futures::select;
use futures_timer::Delay;

use crate::error::Result;
use crate::swarm::Swarm;

/// The stabilization runner.
#[derive(Clone)]
pub struct Stabilizer {
    swarm: Arc<Swarm>,
}

impl Stabilizer {
    /// Create a new stabilization runner.
    pub fn new(swarm: Arc<Swarm>) -> Self {
        Self { swarm }
    }

    /// Run stabilization once.
    /// A failing step is logged and the next one still runs.
    pub async fn stabilize(&self) -> Result<()> {
        tracing::debug!("STABILIZATION evict_stale_connections start");
        if let Err(e) = self.evict_stale_connections().await {
            tracing::error!("[stabilize] Failed on evict stale connections {:?}", e);
        }
        tracing::debug!("STABILIZATION check_predecessor start");
        if let Err(e) = self.check_predecessor().await {
            tracing::error!("[stabilize] Failed on check predecessor {:?}", e);
        }
        tracing::debug!("STABILIZATION update_successor start");
        if let Err(e) = self.update_successor().await {
            tracing::error!("[stabilize] Failed on update successor {:?}", e);
        }
        tracing::debug!("STABILIZATION notify_successor start");
        if let Err(e) = self.notify_successor().await {
            tracing::error!("[stabilize] Failed on notify successor {:?}", e);
        }
        tracing::debug!("STABILIZATION fix_fingers start");
        if let Err(e) = self.fix_fingers().await {
            tracing::error!("[stabilize] Failed on fix_finger {:?}", e);
        }
        tracing::debug!("STABILIZATION end, {:?}", self.swarm.dht().topo_info()?);
        Ok(())
    }

    /// Close idle connections and forget peers that stopped answering.
    pub async fn evict_stale_connections(&self) -> Result<()> {
        let dead = self.swarm.peers().evict_stale(Utc::now()).await;
        for did in dead {
            tracing::info!("STABILIZATION remove unreachable {}", did);
            self.swarm.dht().remove(&did)?;
        }
        Ok(())
    }

    /// Clear a predecessor that no longer answers.
    pub async fn check_predecessor(&self) -> Result<()> {
        let dht = self.swarm.dht();
        if let Some(pred) = dht.predecessor()? {
            if let Err(e) = self.swarm.heartbeat(&pred).await {
                tracing::info!("STABILIZATION predecessor {} unreachable: {}", pred, e);
                dht.remove(&pred.did)?;
            }
        }
        Ok(())
    }

    /// Ask the successor for its predecessor and move to it when it sits between us.
    /// An unreachable successor is dropped in favour of the next finger entry.
    pub async fn update_successor(&self) -> Result<()> {
        let dht = self.swarm.dht();
        let succ = match dht.successor()? {
            Some(succ) => succ,
            None => return Ok(()),
        };
        let candidate = match self.swarm.predecessor_of(&succ).await {
            Ok(candidate) => candidate,
            Err(e) => {
                tracing::warn!("STABILIZATION successor {} unreachable", succ);
                self.swarm.peers().remove(&succ.did).await;
                dht.remove(&succ.did)?;
                return Err(e);
            }
        };
        if let Some(candidate) = candidate {
            if &candidate.did == self.swarm.did() || candidate.did == succ.did {
                return Ok(());
            }
            if self.swarm.heartbeat(&candidate).await.is_err() {
                tracing::debug!("STABILIZATION skip unreachable candidate {}", candidate);
                return Ok(());
            }
            if dht.update_successor(&candidate)? {
                self.swarm.notify(&candidate).await?;
            }
        }
        Ok(())
    }

    /// Remind the successor that we are its predecessor.
    pub async fn notify_successor(&self) -> Result<()> {
        if let Some(succ) = self.swarm.dht().successor()? {
            self.swarm.notify(&succ).await?;
        }
        Ok(())
    }

    /// Re-resolve the owner of every finger target.
    /// A failed lookup keeps the old entry until the next round.
    pub async fn fix_fingers(&self) -> Result<()> {
        let dht = self.swarm.dht();
        for (index, start) in dht.finger_starts()?.into_iter().enumerate() {
            match self.swarm.lookup_id(&start).await {
                Ok(node) => dht.set_finger(index, &node)?,
                Err(e) => tracing::debug!("STABILIZATION fix finger {} failed: {}", index, e),
            }
        }
        Ok(())
    }

    /// Run [Stabilizer::stabilize] every `interval` until `quit` fires or its sender is dropped.
    pub async fn wait(self: Arc<Self>, interval: Duration, quit: oneshot::Receiver<()>) {
        let mut quit = quit.fuse();
        loop {
            let timeout = Delay::new(interval).fuse();
            pin_mut!(timeout);
            select! {
                _ = timeout => self
                    .stabilize()
                    .await
                    .unwrap_or_else(|e| tracing::error!("failed to stabilize {:?}", e)),
                _ = quit => {
                    tracing::info!("stabilization of {} stopped", self.swarm.node());
                    break;
                }
            }
        }
    }
}
