use std::{
    io::Error as IoError,
    mem::MaybeUninit,
    pin::Pin,
    task::{Context, Poll},
};

use futures_util::stream::Stream;
use hyper::body::Bytes;
use tokio::io::{AsyncRead, ReadBuf};

use crate::vfs::ContentFile;

const BUF_SIZE: usize = 8 * 1024;

/// Wraps an `AsyncRead`, like a `ContentFile`, and implements a stream of `Bytes`s.
pub struct FileBytesStream<F = ContentFile> {
    file: F,
    buf: Box<[MaybeUninit<u8>; BUF_SIZE]>,
}

impl<F> FileBytesStream<F> {
    /// Create a new stream from the given file.
    pub fn new(file: F) -> Self {
        Self {
            file,
            buf: Box::new([MaybeUninit::uninit(); BUF_SIZE]),
        }
    }
}

impl<F> Stream for FileBytesStream<F>
where
    F: AsyncRead + Unpin,
{
    type Item = Result<Bytes, IoError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let Self {
            ref mut file,
            ref mut buf,
        } = *self;

        let mut read_buf = ReadBuf::uninit(&mut buf[..]);
        match Pin::new(file).poll_read(cx, &mut read_buf) {
            Poll::Ready(Ok(())) => {
                let filled = read_buf.filled();
                if filled.is_empty() {
                    Poll::Ready(None)
                } else {
                    Poll::Ready(Some(Ok(Bytes::copy_from_slice(filled))))
                }
            }
            Poll::Ready(Err(e)) => Poll::Ready(Some(Err(e))),
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream::TryStreamExt;
    use std::io::Cursor;

    #[tokio::test]
    async fn test_streams_whole_file_in_chunks() {
        let data = vec![b'x'; BUF_SIZE + 10];
        let stream = FileBytesStream::new(Cursor::new(data.clone()));
        let chunks: Vec<Bytes> = stream.try_collect().await.unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks.concat(), data);
    }
}
