use serde::{Deserialize, Serialize};

use crate::channel::Channel;
use crate::codec::Codec;
use crate::error::Result;

/// Perform a one-off TCP request/response
///
/// Opens a connection, sends the request, receives the response, and closes the connection.
pub async fn request_tcp<Req, Res, C>(
    address: impl Into<String>,
    request: &Req,
    codec: C,
) -> Result<Res>
where
    Req: Serialize,
    Res: for<'de> Deserialize<'de>,
    C: Codec,
{
    let mut channel = Channel::tcp(address, codec).await?;
    channel.send(request).await?;
    let response = channel.receive().await?;
    channel.close().await?;
    Ok(response)
}
