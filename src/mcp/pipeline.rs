// Copyright 2026 BadCompany
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Background pump for the child's diagnostic stream.

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Spawns a background task copying child stderr into `sink`, byte for byte.
///
/// The task ends when the child closes its end of the pipe; that is the
/// normal way for it to finish and is only logged at debug level.
pub fn spawn_stderr_pump<R, W>(mut stream: R, mut sink: W) -> JoinHandle<u64>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        match tokio::io::copy(&mut stream, &mut sink).await {
            Ok(bytes) => {
                debug!("Child stderr closed after {} bytes", bytes);
                bytes
            }
            Err(e) => {
                warn!("Child stderr pump stopped: {}", e);
                0
            }
        }
    })
}
