//! Requests that read or control the user's playback.

use log::debug;

use super::{
    transport::{Method, Request, Transport},
    Client, API_CURRENTLY_PLAYING_ENDPOINT, API_DEVICES_ENDPOINT, API_PAUSE_ENDPOINT, API_PLAY_ENDPOINT,
};
use crate::{
    dump,
    error::Result,
    model::playback::{CurrentlyPlaying, Device, DevicesResponse, PlayRequest},
};

impl<Tr> Client<Tr>
where
    Tr: Transport,
{
    /// Get the user's currently playing item. Returns `None` if nothing is playing.
    pub fn currently_playing(&self) -> Result<Option<CurrentlyPlaying>> {
        let playing = self.request_optional(self.new_request(Method::Get, API_CURRENTLY_PLAYING_ENDPOINT))?;

        if playing.is_none() {
            debug!("Nothing is playing");
        }

        Ok(playing)
    }

    /// Get the devices available for playback.
    pub fn devices(&self) -> Result<Vec<Device>> {
        let response: DevicesResponse = self.request(self.new_request(Method::Get, API_DEVICES_ENDPOINT))?;
        Ok(response.devices)
    }

    /// Start or resume playback. Plays on the currently active device unless a device ID is given.
    pub fn play(&self, play: &PlayRequest, device_id: Option<&str>) -> Result<()> {
        let mut request = with_device(self.new_request(Method::Put, API_PLAY_ENDPOINT), device_id);

        // an empty body is left out altogether, resuming the current playback
        let body = dump::dump(play)?;
        if body.as_object().map_or(true, |body| !body.is_empty()) {
            request = request.with_body(body);
        }

        self.execute(request)
    }

    /// Pause playback. Pauses the currently active device unless a device ID is given.
    pub fn pause(&self, device_id: Option<&str>) -> Result<()> {
        self.execute(with_device(self.new_request(Method::Put, API_PAUSE_ENDPOINT), device_id))
    }
}

fn with_device(request: Request, device_id: Option<&str>) -> Request {
    match device_id {
        Some(device_id) => request.with_query("device_id", device_id),
        None => request,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::{
        client::transport::{mock::MockTransport, RawResponse},
        error::{Error, TransportError},
        model::{
            error::ApiErrorMessage,
            playback::{CurrentlyPlayingType, DeviceType, PlayOffset, PlayableItem},
        },
        value::Maybe,
    };

    #[test]
    fn nothing_playing() {
        let transport = MockTransport::new([RawResponse::new(204, "")]);
        let client = Client::new(&transport);

        assert!(client.currently_playing().unwrap().is_none());
        assert_eq!(transport.requests()[0].path, "me/player/currently-playing");
    }

    #[test]
    fn currently_playing_track() {
        let transport = MockTransport::json([json!({
            "is_playing": true,
            "currently_playing_type": "track",
            "progress_ms": 52_000,
            "context": null,
            "item": {"id": "a", "name": "Midnight City", "duration_ms": 243_960, "type": "track"}
        })]);
        let client = Client::new(&transport);

        let playing = client.currently_playing().unwrap().unwrap();

        assert!(*playing.is_playing());
        assert_eq!(*playing.currently_playing_type(), CurrentlyPlayingType::Track);
        assert_eq!(*playing.progress(), Maybe::Set(Duration::from_millis(52_000)));
        assert!(matches!(playing.item(), Maybe::Set(PlayableItem::Track(track)) if track.id() == "a"));
    }

    #[test]
    fn devices_with_unknown_type() {
        let transport = MockTransport::json([json!({"devices": [
            {"id": "d1", "name": "Kitchen", "type": "Speaker", "is_active": false, "volume_percent": 40},
            {"id": null, "name": "Fridge", "type": "Refrigerator", "is_active": true, "volume_percent": null}
        ]})]);
        let client = Client::new(&transport);

        let devices = client.devices().unwrap();

        assert_eq!(devices.len(), 2);
        assert_eq!(*devices[0].device_type(), DeviceType::Speaker);
        assert_eq!(*devices[1].device_type(), DeviceType::Unrecognized(String::from("Refrigerator")));
        assert_eq!(*devices[1].id(), Maybe::Null);
    }

    #[test]
    fn play_context_on_device() {
        let transport = MockTransport::new([RawResponse::new(204, "")]);
        let client = Client::new(&transport);

        let play = PlayRequest::context("spotify:album:1DFixLWuPkv3KT3TnV35m3")
            .with_offset(Maybe::Set(PlayOffset::Position(5)))
            .with_position(Maybe::Set(Duration::from_secs(1)));
        client.play(&play, Some("d1")).unwrap();

        let request = &transport.requests()[0];
        assert_eq!(request.method, Method::Put);
        assert_eq!(request.path, "me/player/play");
        assert_eq!(request.query_value("device_id"), Some("d1"));
        assert_eq!(
            request.body,
            Some(json!({
                "context_uri": "spotify:album:1DFixLWuPkv3KT3TnV35m3",
                "offset": {"position": 5},
                "position_ms": 1000
            }))
        );
    }

    #[test]
    fn resume_sends_no_body() {
        let transport = MockTransport::new([RawResponse::new(204, "")]);
        let client = Client::new(&transport);

        client.play(&PlayRequest::new(), None).unwrap();

        let request = &transport.requests()[0];
        assert!(request.body.is_none());
        assert!(request.query_value("device_id").is_none());
    }

    #[test]
    fn pause_without_active_device() {
        let transport = MockTransport::new([RawResponse::new(
            404,
            r#"{"error": {"status": 404, "message": "Player command failed: No active device found"}}"#,
        )]);
        let client = Client::new(&transport);

        assert!(matches!(
            client.pause(None),
            Err(Error::Transport(TransportError::NotFound {
                reason: ApiErrorMessage::NoActiveDevice,
                ..
            }))
        ));
        assert_eq!(transport.requests()[0].path, "me/player/pause");
    }
}
