/*!
    Per-stream codec configuration.
*/

use ffmpeg_next::codec::Parameters;
use ffmpeg_types::MediaType;

/**
    Codec parameters of one stream, detached from the container.

    Produced by [`crate::Source::codec_config`] and consumed by a decoder,
    which may live on a different thread than the source.
*/
pub struct CodecConfig {
    parameters: Parameters,
    media_type: MediaType,
    stream_index: usize,
}

impl CodecConfig {
    pub(crate) fn new(parameters: Parameters, media_type: MediaType, stream_index: usize) -> Self {
        Self {
            parameters,
            media_type,
            stream_index,
        }
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    pub fn stream_index(&self) -> usize {
        self.stream_index
    }

    /**
        Give up the raw parameters, e.g. to open a decoder context.
    */
    pub fn into_parameters(self) -> Parameters {
        self.parameters
    }
}

// SAFETY: the parameters are a private copy (cloned out of the stream, so they
// hold no reference back to the format context) and are only ever touched by
// whichever single thread currently owns this value.
unsafe impl Send for CodecConfig {}

impl std::fmt::Debug for CodecConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecConfig")
            .field("media_type", &self.media_type)
            .field("stream_index", &self.stream_index)
            .field("codec", &self.parameters.id())
            .finish()
    }
}
